//! Form-field key derivation: type-based defaults, canonical names for common labels, and
//! deterministic collision suffixes.

use std::collections::HashSet;

/// Common field labels (lowercased, accents kept and stripped) and their canonical key.
const COMMON_FIELDS: &[(&str, &str)] = &[
    ("nombre", "name"),
    ("nombre completo", "name"),
    ("name", "name"),
    ("teléfono", "phone"),
    ("telefono", "phone"),
    ("celular", "phone"),
    ("whatsapp", "phone"),
    ("phone", "phone"),
    ("email", "email"),
    ("e-mail", "email"),
    ("correo", "email"),
    ("correo electrónico", "email"),
    ("correo electronico", "email"),
    ("fecha", "date"),
    ("fecha de nacimiento", "birthdate"),
    ("hora", "time"),
    ("dirección", "address"),
    ("direccion", "address"),
    ("domicilio", "address"),
    ("edad", "age"),
    ("documento", "document"),
    ("cédula", "document"),
    ("cedula", "document"),
    ("servicio", "service"),
    ("motivo", "reason"),
    ("motivo de consulta", "reason"),
    ("notas", "notes"),
    ("comentarios", "notes"),
];

/// Canonical key for a well-known label ("Teléfono:" -> "phone"), ignoring case, surrounding
/// whitespace and trailing `:` / `*`.
pub fn canonical_key_for_label(label: &str) -> Option<&'static str> {
    let normalized = label
        .trim()
        .trim_end_matches(|c: char| c == ':' || c == '*')
        .trim()
        .to_lowercase();
    COMMON_FIELDS
        .iter()
        .find(|(l, _)| *l == normalized)
        .map(|(_, key)| *key)
}

/// Returns `base` if unused, else the first of `base1`, `base2`, … not in `existing`.
/// `exclude` is treated as free (the field being re-keyed may keep its own key).
pub fn generate_unique_key<'a, I>(base: &str, existing: I, exclude: Option<&str>) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing
        .into_iter()
        .filter(|k| Some(*k) != exclude)
        .collect();
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 1usize;
    loop {
        let candidate = format!("{}{}", base, n);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_base_is_returned_as_is() {
        assert_eq!(generate_unique_key("text", ["name", "phone"], None), "text");
    }

    #[test]
    fn test_collisions_get_increasing_suffixes() {
        assert_eq!(generate_unique_key("text", ["text"], None), "text1");
        assert_eq!(generate_unique_key("text", ["text", "text1"], None), "text2");
        assert_eq!(generate_unique_key("text", ["text", "text2"], None), "text1");
    }

    #[test]
    fn test_excluded_key_counts_as_free() {
        assert_eq!(
            generate_unique_key("phone", ["phone", "name"], Some("phone")),
            "phone"
        );
    }

    #[test]
    fn test_canonical_key_for_label() {
        assert_eq!(canonical_key_for_label("Nombre"), Some("name"));
        assert_eq!(canonical_key_for_label("  Teléfono: "), Some("phone"));
        assert_eq!(canonical_key_for_label("Correo electrónico*"), Some("email"));
        assert_eq!(canonical_key_for_label("DIRECCIÓN"), Some("address"));
        assert_eq!(canonical_key_for_label("Color favorito"), None);
    }
}
