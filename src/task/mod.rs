//! Tasks that make up the firmware as well as the resources they use.
pub mod http_server;
pub mod network;
pub mod resources;
pub mod sound;
pub mod supervisor;
pub mod task_messages;
pub mod temperature;
pub mod watchdog;
