pub mod config;
pub mod driver;
pub mod instrument;
pub mod lang;
pub mod note;
pub mod output;
pub mod wave;
