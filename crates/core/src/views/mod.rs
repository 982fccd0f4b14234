pub mod derive;
pub mod flamegraph;
pub mod table;
