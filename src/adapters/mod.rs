pub mod auth;
pub mod db;
pub mod html;
pub mod web;
