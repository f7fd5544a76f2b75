pub mod agc;
pub mod analysis;
pub mod bands;
pub mod beat;
pub mod capture;
pub mod decibel;
pub mod decode;
pub mod features;
pub mod levels;
pub mod spectrum;
pub mod transform;
