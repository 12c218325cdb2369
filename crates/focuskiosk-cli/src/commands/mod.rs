pub mod run;
pub mod settings;
pub mod sound;
pub mod tasks;
