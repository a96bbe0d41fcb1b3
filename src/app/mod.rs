// Presentation layer: the five report views rendered as terminal text.

pub mod pages;
