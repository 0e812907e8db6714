//! Interactive confirmation

pub mod console;

pub use console::ConsoleConfirmationResponder;
