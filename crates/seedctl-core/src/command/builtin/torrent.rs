// Torrent commands.

use super::{
    columns_flag, leaf, list_spec, mutate_torrents, mutating, required_filter, select_some,
    sort_flag, targets, toggle_torrents, torrent_filter,
};
use crate::command::args::Invocation;
use crate::command::outcome::{AddEntry, CommandOutcome, Details, MagnetLink};
use crate::command::spec::{ArgType, Arity, Category, CommandSpec, FlagSpec, PositionalSpec, handler};
use crate::error::CoreError;
use crate::field::{format_value, natural_cmp};
use crate::model::{Entity, EntityKind, Torrent};
use crate::remote::{AddOptions, Mutation, RateDirection};
use crate::session::Session;

const T: EntityKind = EntityKind::Torrent;

const DIRECTIONS: &[&str] = &["up", "upload", "down", "dn", "download"];

fn toggle_flag() -> FlagSpec {
    FlagSpec::switch("toggle", Some('t'), "Start stopped torrents and stop the others")
}

pub(super) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "add",
            aliases: &["download", "get"],
            category: Category::Torrent,
            description: "Add torrents from URLs, magnet links or paths on the daemon host",
            usage: &["add [--stopped] [--path DIR] SOURCE..."],
            examples: &["add 'magnet:?xt=urn:btih:...'", "add -s -p /srv/iso https://example.org/a.torrent"],
            node: mutating(
                vec![
                    FlagSpec::switch("stopped", Some('s'), "Do not start the torrent"),
                    FlagSpec::value("path", Some('p'), ArgType::Path, "Download directory"),
                ],
                vec![PositionalSpec::new(
                    "source",
                    ArgType::Text,
                    Arity::OneOrMore,
                    "URL, magnet link or daemon-local path",
                )],
                handler!(add),
            ),
        },
        CommandSpec {
            name: "list",
            aliases: &["ls"],
            category: Category::Torrent,
            description: "List torrents",
            usage: &["list [--sort SORT] [--columns COLS] [--limit N] [FILTER...]"],
            examples: &["ls", "ls -s !rate-down downloading", "ls 'path~/iso/' & ratio>2"],
            node: leaf(
                vec![
                    sort_flag(T),
                    columns_flag(T),
                    FlagSpec::value("limit", Some('l'), ArgType::Integer, "Show at most N torrents"),
                ],
                vec![torrent_filter(Arity::Many)],
                handler!(list),
            ),
        },
        CommandSpec {
            name: "details",
            aliases: &["info"],
            category: Category::Torrent,
            description: "Show every field of a torrent",
            usage: &["details FILTER..."],
            examples: &["details id=71", "info ubuntu"],
            node: leaf(Vec::new(), vec![torrent_filter(Arity::OneOrMore)], handler!(details)),
        },
        CommandSpec {
            name: "magnet",
            aliases: &["uri"],
            category: Category::Torrent,
            description: "Show magnet links of torrents",
            usage: &["magnet FILTER..."],
            examples: &["magnet name~ubuntu"],
            node: leaf(Vec::new(), vec![torrent_filter(Arity::OneOrMore)], handler!(magnet)),
        },
        CommandSpec {
            name: "start",
            aliases: &[],
            category: Category::Torrent,
            description: "Start torrents",
            usage: &["start [--force] [--toggle] FILTER..."],
            examples: &["start stopped", "start -f ubuntu", "start -t id=4"],
            node: mutating(
                vec![
                    FlagSpec::switch("force", Some('f'), "Bypass the download queue"),
                    toggle_flag(),
                ],
                vec![torrent_filter(Arity::OneOrMore)],
                handler!(start),
            ),
        },
        CommandSpec {
            name: "stop",
            aliases: &["pause"],
            category: Category::Torrent,
            description: "Stop torrents",
            usage: &["stop [--toggle] FILTER..."],
            examples: &["stop seeding & ratio>3", "stop all"],
            node: mutating(
                vec![toggle_flag()],
                vec![torrent_filter(Arity::OneOrMore)],
                handler!(stop),
            ),
        },
        CommandSpec {
            name: "verify",
            aliases: &["check"],
            category: Category::Torrent,
            description: "Verify downloaded data",
            usage: &["verify FILTER..."],
            examples: &["verify id=3"],
            node: mutating(Vec::new(), vec![torrent_filter(Arity::OneOrMore)], handler!(verify)),
        },
        CommandSpec {
            name: "announce",
            aliases: &["an"],
            category: Category::Torrent,
            description: "Ask trackers for more peers now",
            usage: &["announce FILTER..."],
            examples: &["announce downloading"],
            node: mutating(Vec::new(), vec![torrent_filter(Arity::OneOrMore)], handler!(announce)),
        },
        CommandSpec {
            name: "remove",
            aliases: &["rm", "delete"],
            category: Category::Torrent,
            description: "Remove torrents, optionally with their data",
            usage: &["remove [--delete-files] [--force] FILTER..."],
            examples: &["rm complete & ratio>5", "rm -d 'name=old file'"],
            node: mutating(
                vec![
                    FlagSpec::switch("delete-files", Some('d'), "Delete downloaded data too"),
                    FlagSpec::switch("force", Some('f'), "Ignore the remove.max-hits limit"),
                ],
                vec![torrent_filter(Arity::OneOrMore)],
                handler!(remove),
            ),
        },
        CommandSpec {
            name: "move",
            aliases: &["mv"],
            category: Category::Torrent,
            description: "Move torrent data to another directory",
            usage: &["move FILTER PATH"],
            examples: &["mv complete /srv/done"],
            node: mutating(
                Vec::new(),
                vec![
                    torrent_filter(Arity::One),
                    PositionalSpec::new("path", ArgType::Path, Arity::One, "Destination directory"),
                ],
                handler!(move_data),
            ),
        },
        CommandSpec {
            name: "rename",
            aliases: &["rn"],
            category: Category::Torrent,
            description: "Rename a single torrent",
            usage: &["rename FILTER NEW-NAME"],
            examples: &["rename id=4 debian-12.iso"],
            node: mutating(
                Vec::new(),
                vec![
                    torrent_filter(Arity::One),
                    PositionalSpec::new("name", ArgType::Text, Arity::One, "New name"),
                ],
                handler!(rename),
            ),
        },
        CommandSpec {
            name: "setseedratiolimit",
            aliases: &[],
            category: Category::Torrent,
            description: "Stop seeding torrents once they reach an upload ratio",
            usage: &["setseedratiolimit FILTER... LIMIT"],
            examples: &["setseedratiolimit ubuntu 2", "setseedratiolimit private 0.5"],
            node: mutating(
                Vec::new(),
                vec![
                    torrent_filter(Arity::OneOrMore),
                    PositionalSpec::new("limit", ArgType::Ratio, Arity::One, "Upload ratio"),
                ],
                handler!(set_seed_ratio_limit),
            ),
        },
        CommandSpec {
            name: "ratelimit",
            aliases: &["rl"],
            category: Category::Torrent,
            description: "Limit upload or download rate of torrents",
            usage: &["ratelimit DIRECTION LIMIT FILTER..."],
            examples: &["rl up 500k seeding", "rl down none all"],
            node: mutating(
                Vec::new(),
                vec![
                    PositionalSpec::new(
                        "direction",
                        ArgType::Choice(DIRECTIONS),
                        Arity::One,
                        "up or down",
                    ),
                    PositionalSpec::new(
                        "limit",
                        ArgType::RateLimit,
                        Arity::One,
                        "Bytes per second, or none",
                    ),
                    torrent_filter(Arity::OneOrMore),
                ],
                handler!(ratelimit),
            ),
        },
    ]
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn add(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let options = AddOptions {
        paused: inv.switch("stopped"),
        path: inv.text("path").map(str::to_owned),
    };
    let mut entries = Vec::new();
    for source in inv.texts("source") {
        let result = session
            .add(source, &options)
            .await
            .map_err(|e| e.to_string());
        entries.push(AddEntry {
            source: source.to_owned(),
            result,
        });
    }
    Ok(CommandOutcome::Added(entries))
}

#[allow(clippy::unused_async)]
async fn list(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let limit = match inv.integer("limit") {
        Some(n) => Some(usize::try_from(n).map_err(|_| CoreError::ArgumentType {
            command: inv.command(),
            name: "--limit".into(),
            value: n.to_string(),
            expected: "a non-negative integer".into(),
            index: 0,
        })?),
        None => None,
    };
    let filter = inv.filter_or_all("filter", T);
    let title = if filter.is_all() {
        "torrents".to_owned()
    } else {
        filter.to_string()
    };
    let spec = list_spec(session, inv, T)
        .with_filter(filter)
        .with_limit(limit)
        .with_title(title);
    Ok(CommandOutcome::View(spec))
}

/// First torrent by name among several matches.
async fn details(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let torrents = select_some::<Torrent>(session, required_filter(inv, "filter")?, None).await?;
    let torrent = torrents
        .iter()
        .min_by(|a, b| natural_cmp(&a.name, &b.name))
        .ok_or_else(|| CoreError::NoMatch {
            what: T.plural().to_owned(),
        })?;
    let opts = session.settings().format_options();
    let rows = Torrent::registry()
        .fields()
        .iter()
        .map(|f| {
            let value = match (f.name, torrent.limit_ratio) {
                ("limit-ratio", None) => "global".to_owned(),
                _ => format_value(&f.value(torrent), f.ty, &opts),
            };
            (f.name, value)
        })
        .collect();
    Ok(CommandOutcome::Details(Details {
        id: torrent.id,
        name: torrent.name.clone(),
        rows,
    }))
}

async fn magnet(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let mut torrents =
        select_some::<Torrent>(session, required_filter(inv, "filter")?, None).await?;
    torrents.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    Ok(CommandOutcome::Magnets(
        torrents
            .iter()
            .map(|t| MagnetLink {
                id: t.id,
                name: t.name.clone(),
                uri: t.magnet.clone(),
            })
            .collect(),
    ))
}

async fn start(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let force = inv.switch("force");
    if inv.switch("toggle") {
        return toggle_torrents(session, inv, force).await;
    }
    mutate_torrents(session, inv, Mutation::Start { force }).await
}

async fn stop(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    if inv.switch("toggle") {
        return toggle_torrents(session, inv, false).await;
    }
    mutate_torrents(session, inv, Mutation::Stop).await
}

async fn verify(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    mutate_torrents(session, inv, Mutation::Verify).await
}

async fn announce(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    mutate_torrents(session, inv, Mutation::Announce).await
}

async fn remove(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let torrents = select_some::<Torrent>(session, required_filter(inv, "filter")?, None).await?;
    let max_hits = usize::try_from(session.settings().integer("remove.max-hits")).unwrap_or(0);
    if torrents.len() > max_hits && !inv.switch("force") {
        return Err(CoreError::refused(format!(
            "{} torrents match, more than remove.max-hits ({max_hits}); use --force to remove them",
            torrents.len()
        )));
    }
    let mutation = Mutation::Remove {
        delete_files: inv.switch("delete-files"),
    };
    let report = session.mutate(T, targets(&torrents), mutation).await;
    Ok(CommandOutcome::Mutation(report))
}

async fn move_data(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let path = inv.text("path").unwrap_or_default().to_owned();
    mutate_torrents(session, inv, Mutation::Move { path }).await
}

async fn rename(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let torrents = select_some::<Torrent>(session, required_filter(inv, "filter")?, None).await?;
    let [torrent] = torrents.as_slice() else {
        return Err(CoreError::refused(format!(
            "rename needs exactly one torrent, {} match",
            torrents.len()
        )));
    };
    let mutation = Mutation::Rename {
        from: torrent.name.clone(),
        to: inv.text("name").unwrap_or_default().to_owned(),
    };
    let report = session
        .mutate(T, targets(std::slice::from_ref(torrent)), mutation)
        .await;
    Ok(CommandOutcome::Mutation(report))
}

async fn set_seed_ratio_limit(
    session: &Session,
    inv: &Invocation,
) -> Result<CommandOutcome, CoreError> {
    let ratio = inv.number("limit").unwrap_or_default();
    mutate_torrents(session, inv, Mutation::SetSeedRatioLimit(ratio)).await
}

async fn ratelimit(session: &Session, inv: &Invocation) -> Result<CommandOutcome, CoreError> {
    let direction = inv
        .text("direction")
        .and_then(RateDirection::parse)
        .unwrap_or(RateDirection::Down);
    let limit = inv.rate_limit("limit").flatten();
    mutate_torrents(session, inv, Mutation::SetRateLimit { direction, limit }).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use crate::command::{CommandOutcome, Dispatcher, EntryOutcome, MagnetLink};
    use crate::error::CoreError;
    use crate::model::{EntityId, StatusSet, TorrentStatus};
    use crate::remote::{Mutation, RateDirection, RemoteClient};
    use crate::session::Session;
    use crate::settings::Settings;
    use crate::test_support::{FakeRemote, torrent};

    fn setup(names: &[&str]) -> (Arc<FakeRemote>, Dispatcher) {
        let torrents = names
            .iter()
            .zip(1..)
            .map(|(name, id)| torrent(id, name))
            .collect();
        let fake = Arc::new(FakeRemote::with_torrents(torrents));
        let client: Arc<dyn RemoteClient> = Arc::clone(&fake) as Arc<dyn RemoteClient>;
        let session = Session::new(client, Arc::new(Settings::new()));
        (fake, Dispatcher::new(session))
    }

    async fn outcome(dispatcher: &Dispatcher, line: &str) -> Result<CommandOutcome, CoreError> {
        let mut report = dispatcher.run_line(line).await.unwrap();
        report.runs.pop().unwrap().result
    }

    #[tokio::test]
    async fn list_uses_settings_defaults_and_flags() {
        let (_, dispatcher) = setup(&[]);
        let CommandOutcome::View(spec) = outcome(&dispatcher, "ls").await.unwrap() else {
            panic!("expected a view");
        };
        assert_eq!(spec.sort.to_string(), "name");
        assert_eq!(spec.columns.first(), Some(&"id"));
        assert_eq!(spec.title, "torrents");

        let CommandOutcome::View(spec) =
            outcome(&dispatcher, "ls -s !size -c name -l 2 seeding").await.unwrap()
        else {
            panic!("expected a view");
        };
        assert_eq!(spec.sort.to_string(), "!size");
        assert_eq!(spec.columns, ["name"]);
        assert_eq!(spec.limit, Some(2));
        assert_eq!(spec.title, "seeding");
    }

    #[tokio::test]
    async fn stop_reports_per_torrent() {
        let (fake, dispatcher) = setup(&["a", "b", "c"]);
        fake.reject
            .lock()
            .unwrap()
            .insert(EntityId::Torrent(2), "not found".into());

        let CommandOutcome::Mutation(report) = outcome(&dispatcher, "stop all").await.unwrap() else {
            panic!("expected a mutation");
        };
        let outcomes: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.outcome.clone()))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("a", EntryOutcome::Ok),
                ("b", EntryOutcome::Rejected("not found".into())),
                ("c", EntryOutcome::Ok),
            ]
        );
    }

    #[tokio::test]
    async fn mutations_without_a_filter_call_nothing() {
        let (fake, dispatcher) = setup(&["a", "b", "c"]);
        for line in ["stop", "rm -fd", "start --toggle", "verify", "mv /srv", "rl up 1M"] {
            assert!(
                matches!(
                    outcome(&dispatcher, line).await,
                    Err(CoreError::MissingArgument { .. })
                ),
                "{line}"
            );
        }
        assert!(fake.mutations.lock().unwrap().is_empty());
        assert_eq!(fake.listings(), 0);

        let CommandOutcome::Mutation(report) = outcome(&dispatcher, "stop all").await.unwrap()
        else {
            panic!("expected a mutation");
        };
        assert_eq!(report.succeeded(), 3);
    }

    #[tokio::test]
    async fn toggle_starts_stopped_and_stops_running() {
        let (fake, dispatcher) = setup(&["a", "b", "c"]);
        fake.torrents.lock().unwrap()[1].status = StatusSet::new(vec![TorrentStatus::Stopped]);

        let CommandOutcome::Mutation(report) =
            outcome(&dispatcher, "start -f -t all").await.unwrap()
        else {
            panic!("expected a mutation");
        };
        assert_eq!(report.action, "toggled");
        assert_eq!(report.succeeded(), 3);

        let mut mutations: Vec<_> = fake
            .mutations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ids, m)| (ids[0].clone(), m.clone()))
            .collect();
        mutations.sort_by_key(|(id, _)| id.torrent_id());
        assert_eq!(
            mutations,
            vec![
                (EntityId::Torrent(1), Mutation::Stop),
                (EntityId::Torrent(2), Mutation::Start { force: true }),
                (EntityId::Torrent(3), Mutation::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn details_shows_first_match_by_name() {
        let (_, dispatcher) = setup(&["ubuntu-server", "ubuntu"]);
        let CommandOutcome::Details(details) =
            outcome(&dispatcher, "info ubuntu").await.unwrap()
        else {
            panic!("expected details");
        };
        assert_eq!((details.id, details.name.as_str()), (2, "ubuntu"));
        let row = |name: &str| {
            details
                .rows
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value.clone())
        };
        assert_eq!(row("name").as_deref(), Some("ubuntu"));
        assert_eq!(row("limit-ratio").as_deref(), Some("global"));
        assert_eq!(
            row("magnet"),
            Some(format!("magnet:?xt=urn:btih:{:040x}", 2))
        );
    }

    #[tokio::test]
    async fn magnet_lists_links_in_name_order() {
        let (_, dispatcher) = setup(&["b", "a"]);
        let CommandOutcome::Magnets(links) = outcome(&dispatcher, "uri all").await.unwrap() else {
            panic!("expected magnet links");
        };
        assert_eq!(
            links,
            vec![
                MagnetLink {
                    id: 2,
                    name: "a".into(),
                    uri: format!("magnet:?xt=urn:btih:{:040x}", 2),
                },
                MagnetLink {
                    id: 1,
                    name: "b".into(),
                    uri: format!("magnet:?xt=urn:btih:{:040x}", 1),
                },
            ]
        );
    }

    #[tokio::test]
    async fn seed_ratio_limit_applies_to_matches() {
        let (fake, dispatcher) = setup(&["a", "b"]);
        let CommandOutcome::Mutation(report) =
            outcome(&dispatcher, "setseedratiolimit b 2.5").await.unwrap()
        else {
            panic!("expected a mutation");
        };
        assert_eq!(report.action, "ratio limited");
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(
            mutations.as_slice(),
            [(
                crate::model::EntityKind::Torrent,
                vec![EntityId::Torrent(2)],
                Mutation::SetSeedRatioLimit(2.5)
            )]
        );
    }

    #[tokio::test]
    async fn no_match_calls_nothing() {
        let (fake, dispatcher) = setup(&["a"]);
        assert!(matches!(
            outcome(&dispatcher, "stop zzz").await,
            Err(CoreError::NoMatch { .. })
        ));
        assert!(fake.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_respects_max_hits() {
        let (fake, dispatcher) = setup(&["a1", "a2", "a3"]);
        dispatcher
            .session()
            .settings()
            .set("remove.max-hits", "2")
            .unwrap();

        assert!(matches!(
            outcome(&dispatcher, "rm a").await,
            Err(CoreError::Refused { .. })
        ));
        assert!(fake.mutations.lock().unwrap().is_empty());

        let CommandOutcome::Mutation(report) = outcome(&dispatcher, "rm -fd a").await.unwrap()
        else {
            panic!("expected a mutation");
        };
        assert_eq!(report.succeeded(), 3);
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(mutations[0].2, Mutation::Remove { delete_files: true });
    }

    #[tokio::test]
    async fn rename_needs_exactly_one_match() {
        let (fake, dispatcher) = setup(&["ubuntu", "ubuntu-server"]);
        assert!(matches!(
            outcome(&dispatcher, "rename ubuntu new").await,
            Err(CoreError::Refused { .. })
        ));
        outcome(&dispatcher, "rename 'name=ubuntu' new").await.unwrap();
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(
            mutations[0].2,
            Mutation::Rename {
                from: "ubuntu".into(),
                to: "new".into()
            }
        );
    }

    #[tokio::test]
    async fn ratelimit_parses_direction_and_limit() {
        let (fake, dispatcher) = setup(&["a"]);
        outcome(&dispatcher, "rl upload 2M all").await.unwrap();
        outcome(&dispatcher, "rl dn unlimited a").await.unwrap();
        let mutations = fake.mutations.lock().unwrap();
        assert_eq!(
            mutations[0].2,
            Mutation::SetRateLimit {
                direction: RateDirection::Up,
                limit: Some(2_000_000)
            }
        );
        assert_eq!(
            mutations[1].2,
            Mutation::SetRateLimit {
                direction: RateDirection::Down,
                limit: None
            }
        );
    }

    #[tokio::test]
    async fn add_reports_duplicates() {
        let (_, dispatcher) = setup(&["a"]);
        let CommandOutcome::Added(entries) = outcome(&dispatcher, "add a b").await.unwrap() else {
            panic!("expected added");
        };
        assert!(matches!(
            entries[0].result,
            Ok(crate::remote::AddOutcome::Duplicate { id: 1, .. })
        ));
        assert!(matches!(
            entries[1].result,
            Ok(crate::remote::AddOutcome::Added { id: 2, .. })
        ));
    }
}
