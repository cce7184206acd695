// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use uuid::Uuid;

use crate::domain::repository::GuidGenerator;

/// Random (v4) UUIDs in hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl GuidGenerator for UuidGenerator {
    fn new_guid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
