pub mod controller;
pub mod participant;
pub mod result;
