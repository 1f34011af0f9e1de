//! Parser pour les fichiers CPG (code page du DBF)

use encoding_rs::Encoding;

/// Encodage utilisé quand le `.cpg` est absent ou illisible
pub fn default_encoding() -> &'static Encoding {
    encoding_rs::WINDOWS_1252
}

/// Retourne l'encodage déclaré dans un `.cpg`
pub fn parse(data: &[u8]) -> &'static Encoding {
    let label = String::from_utf8_lossy(data);
    label_to_encoding(label.trim())
}

/// Mappe les libellés CPG courants (ESRI, GDAL) vers les encodages
fn label_to_encoding(label: &str) -> &'static Encoding {
    match label.to_uppercase().as_str() {
        "UTF-8" | "UTF8" | "65001" => encoding_rs::UTF_8,
        // encoding_rs traite ISO-8859-1 comme Windows-1252 (WHATWG)
        "ISO-8859-1" | "ISO88591" | "8859-1" | "88591" | "LATIN1" | "1252" | "ANSI 1252" => {
            encoding_rs::WINDOWS_1252
        }
        "ISO-8859-15" | "8859-15" | "885915" => encoding_rs::ISO_8859_15,
        "866" => encoding_rs::IBM866,
        _ => Encoding::for_label(label.as_bytes()).unwrap_or_else(default_encoding),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utf8() {
        assert_eq!(parse(b"UTF-8").name(), "UTF-8");
        assert_eq!(parse(b"utf-8\r\n").name(), "UTF-8");
    }

    #[test]
    fn test_parse_latin1() {
        assert_eq!(parse(b"ISO-8859-1").name(), "windows-1252");
        assert_eq!(parse(b"88591").name(), "windows-1252");
    }

    #[test]
    fn test_parse_unknown_falls_back() {
        assert_eq!(parse(b"NOT_A_CODEPAGE").name(), default_encoding().name());
    }

    #[test]
    fn test_parse_whatwg_label() {
        assert_eq!(parse(b"shift_jis").name(), "Shift_JIS");
    }
}
