mod permissive;
mod scalars;

mod utils;
