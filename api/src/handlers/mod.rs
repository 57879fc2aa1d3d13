pub mod asks;
pub mod auth;
