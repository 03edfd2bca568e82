pub mod result;
pub mod serialization;
pub mod state;
pub mod view;
