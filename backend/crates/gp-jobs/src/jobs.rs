use serde_json::Value;

/// Generate and persist an embedding for one graph node
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedJob {
    pub tenant_id: String,
    pub node_id: String,
    pub text: String,
}

/// One audit trail entry
#[derive(Debug, Clone, PartialEq)]
pub struct AuditJob {
    pub tenant_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub actor: String,
    pub detail: Value,
}
