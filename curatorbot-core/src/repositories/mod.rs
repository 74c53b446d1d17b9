// File: src/repositories/mod.rs

pub mod postgres;

pub use curatorbot_common::traits::repository_traits::{
    ActivityRepository, BotConfigRepository, CuratorRepository, FactionRepository,
    TaskReportRepository, TrackingRepository,
};
