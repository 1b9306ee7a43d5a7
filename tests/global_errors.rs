//! tests/global_errors.rs
//! This file serves as an integration test crate that aggregates all
//! tests from the global_errors subdirectory.

#[cfg(test)]
mod global_errors {
    #[path = "../global_errors/401.rs"]
    mod e401;

    #[path = "../global_errors/404.rs"]
    mod e404;

    #[path = "../global_errors/408.rs"]
    mod e408;

    #[path = "../global_errors/413.rs"]
    mod e413;

    #[path = "../global_errors/503.rs"]
    mod e503;
}
