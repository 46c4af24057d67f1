#![no_std]

extern crate alloc;

pub mod alphabet;
pub mod arith;
pub mod decrypt;
pub mod disambiguate;
pub mod encrypt;
pub mod keygen;
