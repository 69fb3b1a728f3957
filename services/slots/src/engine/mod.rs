pub mod draw;
pub mod random;
pub mod rules;

pub use draw::{draw_reels, OutcomeClass};
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use rules::evaluate;
