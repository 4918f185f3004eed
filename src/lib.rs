pub mod config;
pub mod error;
pub mod fetch;
pub mod headway;
pub mod output;
pub mod parser;
pub mod poller;
pub mod state;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}
