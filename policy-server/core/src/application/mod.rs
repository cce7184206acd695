// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod egress_destination_store;
pub mod egress_policy_store;
pub mod policy_cleaner;
mod transaction;

pub use egress_destination_store::EgressDestinationStore;
pub use egress_policy_store::EgressPolicyStore;
pub use policy_cleaner::{PlatformClient, PolicyCleaner, PolicyCleanupStore};
