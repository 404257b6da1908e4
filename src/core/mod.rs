// Core value types shared by every engine subsystem

pub mod color;

pub use color::Color;
