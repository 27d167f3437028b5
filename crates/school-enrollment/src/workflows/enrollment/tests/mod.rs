mod common;
mod contract;
