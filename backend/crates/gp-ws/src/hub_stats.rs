use std::collections::HashMap;

use serde::Serialize;

/// Point-in-time view of hub membership
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub total: usize,
    pub per_tenant: HashMap<String, usize>,
}

impl HubStats {
    pub fn tenant(&self, tenant_id: &str) -> usize {
        self.per_tenant.get(tenant_id).copied().unwrap_or(0)
    }
}
