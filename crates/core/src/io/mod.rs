pub mod input;
pub mod onebot;
pub mod output;
