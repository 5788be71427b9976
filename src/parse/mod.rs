pub mod builder;
pub mod lexer;
pub mod tokenize;
pub mod types;

pub use builder::{ParseOptions, expand_word, parse};
pub use lexer::{TokenKind, classify};
pub use tokenize::{strip_quotes, tokenize};
pub use types::{Chain, Operator, Pipeline, Runner, Stage, Stream};
