/// Generate a canonical record identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate an HL7 message control ID (MSH-10) for an outbound ADT message.
pub fn generate_control_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
