// Commands on files, peers and trackers of torrents.

use std::str::FromStr;

use super::{
    columns_flag, leaf, list_spec, mutate_torrents, mutating, required_filter, select_some,
    sort_flag, targets, torrent_filter, torrent_scope,
};
use crate::command::args::Invocation;
use crate::command::outcome::CommandOutcome;
use crate::command::spec::{
    ArgType, Arity, Category, CommandNode, CommandSpec, PositionalSpec, handler,
};
use crate::error::CoreError;
use crate::filter::Filter;
use crate::model::{EntityKind, FilePriority, TorrentFile, Tracker};
use crate::remote::Mutation;
use crate::session::Session;

fn scope_filter(arity: Arity, description: &'static str) -> PositionalSpec {
    PositionalSpec::new("torrent", ArgType::Filter(EntityKind::Torrent), arity, description)
}

fn item_filter(kind: EntityKind, description: &'static str) -> PositionalSpec {
    PositionalSpec::new("filter", ArgType::Filter(kind), Arity::Many, description)
}

fn list_command(
    name: &'static str,
    aliases: &'static [&'static str],
    kind: EntityKind,
    category: Category,
    description: &'static str,
    usage: &'static [&'static str],
    examples: &'static [&'static str],
) -> CommandSpec {
    CommandSpec {
        name,
        aliases,
        category,
        description,
        usage,
        examples,
        node: leaf(
            vec![sort_flag(kind), columns_flag(kind)],
            vec![
                scope_filter(Arity::Optional, "Torrents whose items to show (default: all)"),
                item_filter(kind, "Items to show"),
            ],
            match kind {
                EntityKind::File => handler!(file_list),
                EntityKind::Peer => handler!(peer_list),
                _ => handler!(tracker_list),
            },
        ),
    }
}

pub(super) fn commands() -> Vec<CommandSpec> {
    vec![
        list_command(
            "filelist",
            &["fls", "lsf"],
            EntityKind::File,
            Category::File,
            "List files of torrents",
            &["filelist [--sort SORT] [--columns COLS] [TORRENT-FILTER] [FILE-FILTER...]"],
            &["fls ubuntu", "fls all 'name~\\.nfo$'"],
        ),
        list_command(
            "peerlist",
            &["pls", "lsp"],
            EntityKind::Peer,
            Category::Peer,
            "List peers of torrents",
            &["peerlist [--sort SORT] [--columns COLS] [TORRENT-FILTER] [PEER-FILTER...]"],
            &["pls", "pls downloading rate-down>100k"],
        ),
        list_command(
            "trackerlist",
            &["tls", "lst"],
            EntityKind::Tracker,
            Category::Tracker,
            "List trackers of torrents",
            &["trackerlist [--sort SORT] [--columns COLS] [TORRENT-FILTER] [TRACKER-FILTER...]"],
            &["tls", "tls all 'error~timed out'"],
        ),
        CommandSpec {
            name: "priority",
            aliases: &["prio"],
            category: Category::File,
            description: "Change download priority of files; off skips them",
            usage: &["priority PRIORITY TORRENT-FILTER [FILE-FILTER...]"],
            examples: &["prio high ubuntu 'name~\\.iso$'", "prio off all 'name~sample'"],
            node: mutating(
                Vec::new(),
                vec![
                    PositionalSpec::new(
                        "priority",
                        ArgType::Choice(FilePriority::names()),
                        Arity::One,
                        "off, low, normal or high",
                    ),
                    scope_filter(Arity::One, "Torrents whose files to change"),
                    item_filter(EntityKind::File, "Files to change (default: all)"),
                ],
                handler!(priority),
            ),
        },
        CommandSpec {
            name: "tracker",
            aliases: &["trk"],
            category: Category::Tracker,
            description: "Add or remove announce URLs",
            usage: &["tracker add URL FILTER...", "tracker remove URL FILTER..."],
            examples: &["tracker add https://tracker.example/announce ubuntu"],
            node: CommandNode::Branch(vec![
                CommandSpec {
                    name: "add",
                    aliases: &[],
                    category: Category::Tracker,
                    description: "Add an announce URL to torrents",
                    usage: &["tracker add URL FILTER..."],
                    examples: &["tracker add https://tracker.example/announce ubuntu"],
                    node: mutating(
                        Vec::new(),
                        vec![
                            PositionalSpec::new("url", ArgType::Text, Arity::One, "Announce URL"),
                            torrent_filter(Arity::OneOrMore),
                        ],
                        handler!(tracker_add),
                    ),
                },
                CommandSpec {
                    name: "remove",
                    aliases: &["rm"],
                    category: Category::Tracker,
                    description: "Remove a tracker, by announce URL or domain, from torrents",
                    usage: &["tracker remove URL FILTER..."],
                    examples: &["tracker rm tracker.example all"],
                    node: mutating(
                        Vec::new(),
                        vec![
                            PositionalSpec::new(
                                "url",
                                ArgType::Text,
                                Arity::One,
                                "Announce URL or domain",
                            ),
                            torrent_filter(Arity::OneOrMore),
                        ],
                        handler!(tracker_remove),
                    ),
                },
            ]),
        },
    ]
}

// ── Handlers ─────────────────────────────────────────────────────────

/// View of `kind` items scoped to the torrents the `torrent` positional
/// matches. Without a torrent filter the view is unscoped.
async fn scoped_list(
    session: &Session,
    inv: &Invocation,
    kind: EntityKind,
) -> Result<CommandOutcome, CoreError> {
    let mut spec = list_spec(session, inv, kind).with_filter(inv.filter_or_all("filter", kind));
    let title = match inv.filter("torrent") {
        Some(torrents) => {
            let scope = torrent_scope(session, torrents).await?;
            spec = spec.with_scope(scope);
            format!("{} of {torrents}", kind.plural())
        }
        None => kind.plural().to_owned(),
    };
    Ok(CommandOutcome::View(spec.with_title(title)))
}

async fn file_list(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    scoped_list(session, inv, EntityKind::File).await
}

async fn peer_list(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    scoped_list(session, inv, EntityKind::Peer).await
}

async fn tracker_list(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    scoped_list(session, inv, EntityKind::Tracker).await
}

async fn priority(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let priority = inv
        .text("priority")
        .and_then(|p| FilePriority::from_str(p).ok())
        .unwrap_or(FilePriority::Normal);
    let scope = torrent_scope(session, required_filter(inv, "torrent")?).await?;
    let filter = inv.filter_or_all("filter", EntityKind::File);
    let files = select_some::<TorrentFile>(session, &filter, Some(&scope)).await?;
    let report = session
        .mutate(EntityKind::File, targets(&files), Mutation::SetPriority(priority))
        .await;
    Ok(CommandOutcome::Mutation(report))
}

async fn tracker_add(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let url = inv.text("url").unwrap_or_default().to_owned();
    mutate_torrents(session, inv, Mutation::AddTracker { url }).await
}

async fn tracker_remove(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let url = inv.text("url").unwrap_or_default();
    let scope = torrent_scope(session, required_filter(inv, "filter")?).await?;
    let trackers: Vec<_> = session
        .select::<Tracker>(&Filter::all(EntityKind::Tracker), Some(&scope))
        .await?
        .into_iter()
        .filter(|t| t.url_announce == url || t.domain.eq_ignore_ascii_case(url))
        .collect();
    if trackers.is_empty() {
        return Err(CoreError::NoMatch {
            what: format!("trackers: {url}"),
        });
    }
    let report = session
        .mutate(EntityKind::Tracker, targets(&trackers), Mutation::RemoveTracker)
        .await;
    Ok(CommandOutcome::Mutation(report))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::command::{CommandOutcome, Dispatcher};
    use crate::error::CoreError;
    use crate::model::{EntityId, EntityKind, FilePriority};
    use crate::remote::{Mutation, RemoteClient};
    use crate::session::Session;
    use crate::settings::Settings;
    use crate::test_support::{FakeRemote, file, torrent, tracker};

    fn setup() -> (Arc<FakeRemote>, Dispatcher) {
        let fake = Arc::new(FakeRemote::with_torrents(vec![
            torrent(1, "ubuntu"),
            torrent(2, "debian"),
        ]));
        *fake.files.lock().unwrap() = vec![
            file(1, 0, "ubuntu.iso"),
            file(1, 1, "README"),
            file(2, 0, "debian.iso"),
        ];
        *fake.trackers.lock().unwrap() = vec![
            tracker(1, 0, "https://a.example/announce"),
            tracker(2, 0, "https://b.example/announce"),
        ];
        let client: Arc<dyn RemoteClient> = Arc::clone(&fake) as Arc<dyn RemoteClient>;
        let session = Session::new(client, Arc::new(Settings::new()));
        (fake, Dispatcher::new(session))
    }

    async fn outcome(dispatcher: &Dispatcher, line: &str) -> Result<CommandOutcome, CoreError> {
        let mut report = dispatcher.run_line(line).await.unwrap();
        report.runs.pop().unwrap().result
    }

    #[tokio::test]
    async fn filelist_scopes_to_matching_torrents() {
        let (_, dispatcher) = setup();
        let CommandOutcome::View(spec) = outcome(&dispatcher, "fls ubuntu").await.unwrap() else {
            panic!("expected a view");
        };
        assert_eq!(spec.kind, EntityKind::File);
        assert_eq!(spec.scope, Some(BTreeSet::from([1])));
        assert_eq!(spec.title, "files of name~ubuntu");

        let CommandOutcome::View(spec) = outcome(&dispatcher, "lsf").await.unwrap() else {
            panic!("expected a view");
        };
        assert_eq!(spec.scope, None);
        assert_eq!(spec.title, "files");
    }

    #[tokio::test]
    async fn priority_targets_files_inside_scope() {
        let (fake, dispatcher) = setup();
        let CommandOutcome::Mutation(report) =
            outcome(&dispatcher, "prio off ubuntu iso").await.unwrap()
        else {
            panic!("expected a mutation");
        };
        assert_eq!(report.entries.len(), 1);
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(
            mutations[0],
            (
                EntityKind::File,
                vec![EntityId::File {
                    torrent: 1,
                    index: 0
                }],
                Mutation::SetPriority(FilePriority::Off)
            )
        );
    }

    #[tokio::test]
    async fn tracker_remove_matches_url_or_domain() {
        let (fake, dispatcher) = setup();
        outcome(&dispatcher, "tracker rm b.example all").await.unwrap();
        assert!(matches!(
            outcome(&dispatcher, "tracker remove https://nowhere/announce all").await,
            Err(CoreError::NoMatch { .. })
        ));
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(mutations.len(), 1);
        assert_eq!(
            mutations[0].1,
            vec![EntityId::Tracker {
                torrent: 2,
                tracker: 0
            }]
        );
    }

    #[tokio::test]
    async fn tracker_add_applies_to_torrents() {
        let (fake, dispatcher) = setup();
        outcome(&dispatcher, "trk add https://c.example/announce debian")
            .await
            .unwrap();
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(mutations[0].0, EntityKind::Torrent);
        assert_eq!(
            mutations[0].2,
            Mutation::AddTracker {
                url: "https://c.example/announce".into()
            }
        );
    }

    #[tokio::test]
    async fn file_and_tracker_changes_need_a_torrent_filter() {
        let (fake, dispatcher) = setup();
        for line in ["prio off", "tracker add https://c.example/announce", "trk rm a.example"] {
            assert!(
                matches!(
                    outcome(&dispatcher, line).await,
                    Err(CoreError::MissingArgument { .. })
                ),
                "{line}"
            );
        }
        assert!(fake.mutations.lock().unwrap().is_empty());
    }
}
