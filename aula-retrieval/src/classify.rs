//! Keyword-based query classification.
//!
//! Buckets are checked in a fixed precedence order — location, contact,
//! technical, procedure — so a query matching several lists classifies the
//! same way every time. Anything unmatched is General.

use regex::Regex;
use tracing::debug;

use aula_core::query::QueryKind;

pub struct QueryClassifier {
    location: Regex,
    contact: Regex,
    technical: Regex,
    procedure: Regex,
}

impl QueryClassifier {
    pub fn new() -> Self {
        // Spanish keywords are listed with and without diacritics; users
        // type both.
        Self {
            location: Regex::new(
                r"(?i)\b(donde|dónde|ubicacion|ubicación|ubicado|ubicada|edificio|sala|campus|piso|llegar|mapa|where|location|building|room|floor)\b",
            )
            .expect("static regex"),
            contact: Regex::new(
                r"(?i)\b(telefono|teléfono|fono|correo|email|contacto|contactar|llamar|anexo|extension|extensión|escribir|phone|contact|mail)\b",
            )
            .expect("static regex"),
            technical: Regex::new(
                r"(?i)\b(wifi|vpn|contraseña|password|clave|error|configurar|instalar|sistema|plataforma|intranet|moodle|login|acceso|certificado digital|impresora|network)\b",
            )
            .expect("static regex"),
            procedure: Regex::new(
                r"(?i)\b(como|cómo|tramite|trámite|tramitar|solicitar|solicitud|postular|proceso|pasos|requisitos|inscribir|inscripcion|inscripción|matricular|renovar|how|steps|process|apply|renew)\b",
            )
            .expect("static regex"),
        }
    }

    pub fn classify(&self, query: &str) -> QueryKind {
        let kind = if self.location.is_match(query) {
            QueryKind::Location
        } else if self.contact.is_match(query) {
            QueryKind::Contact
        } else if self.technical.is_match(query) {
            QueryKind::Technical
        } else if self.procedure.is_match(query) {
            QueryKind::Procedure
        } else {
            QueryKind::General
        };
        debug!(?kind, query, "query classified");
        kind
    }
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new()
    }
}
