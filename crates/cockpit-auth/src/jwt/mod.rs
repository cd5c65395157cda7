//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! JWT (JSON Web Token) encoding and decoding

pub mod claims;
pub mod manager;

// Re-export commonly used types
pub use claims::{JwtClaims, TokenType};
pub use manager::JwtManager;
