use serde::{Deserialize, Serialize};

/// Backend-assigned identity key
pub type IdentityId = i64;

/// A contact record created by the backend in response to a contact submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Body of `POST /usuarios`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIdentity {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_backend_json() {
        let identity: Identity = serde_json::from_str(
            r#"{"id": 7, "nombre": "Juan Pérez", "correo": "juan@example.com", "telefono": null}"#,
        )
        .unwrap();
        assert_eq!(identity.id, 7);
        assert_eq!(identity.name, "Juan Pérez");
        assert_eq!(identity.phone, None);
    }

    #[test]
    fn test_new_identity_omits_missing_phone() {
        let body = NewIdentity {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["nombre"], "Ana");
        assert_eq!(json["correo"], "ana@example.com");
        assert!(json.get("telefono").is_none());
    }
}
