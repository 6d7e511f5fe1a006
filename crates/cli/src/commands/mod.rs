// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod checksums;
pub mod open;
pub mod roms;
pub mod set_kernel;
pub mod switch;
