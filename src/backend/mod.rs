pub mod actions;
pub mod config;
pub mod rewards;
pub mod router;
pub mod twitch;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;
