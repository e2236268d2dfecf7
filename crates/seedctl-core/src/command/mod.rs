// ── Command layer ──
//
// Tokenizing, chaining, argument binding, and the built-in commands.

mod args;
mod builtin;
mod chain;
mod dispatch;
mod lexer;
mod outcome;
mod registry;
mod spec;

pub use args::{ArgValue, Invocation};
pub use chain::{ChainOp, Link, split_chain};
pub use dispatch::{ChainReport, CommandRun, Dispatcher};
pub use lexer::{Word, tokenize};
pub use outcome::{
    AddEntry, CommandOutcome, Details, EntryOutcome, Help, MagnetLink, MutationEntry,
    MutationReport,
};
pub use registry::{Bound, CommandRegistry};
pub(crate) use spec::handler;
pub use spec::{
    ArgType, Arity, Category, CommandNode, CommandSpec, FlagArity, FlagSpec, Handler, Leaf,
    PositionalSpec,
};
