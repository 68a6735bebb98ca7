use wasm_bindgen::prelude::*;

mod bindings;
mod capabilities;
mod channel;
mod config;
pub mod controller;
mod engagement;
mod error;
mod media_element;
mod source_resolver;
mod strategies;
mod utils;

#[cfg(test)]
mod test_utils;

pub use utils::logger::Logger;
