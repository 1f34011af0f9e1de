//! Parser pour les fichiers DBF (attributs, dBASE III)

use encoding_rs::Encoding;
use memchr::memchr;

use crate::types::{Field, FieldType, Value};
use crate::TigerError;

/// Terminateur des descripteurs de champs
const FIELD_TERMINATOR: u8 = 0x0D;

/// Flag d'enregistrement supprimé
const DELETED: u8 = b'*';

/// Table DBF décodée
#[derive(Debug)]
pub struct DbfTable {
    pub fields: Vec<Field>,

    /// Un élément par enregistrement, `None` si l'enregistrement est supprimé
    pub records: Vec<Option<Vec<Value>>>,
}

/// Parse un `.dbf` avec l'encodage donné pour les champs texte
pub fn parse(data: &[u8], encoding: &'static Encoding) -> Result<DbfTable, TigerError> {
    if data.len() < 32 {
        return Err(TigerError::parse_error("DBF", "file shorter than header"));
    }

    let num_records = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
    let record_len = u16::from_le_bytes([data[10], data[11]]) as usize;

    if header_len < 33 || header_len > data.len() {
        return Err(TigerError::parse_error(
            "DBF",
            format!("invalid header length {}", header_len),
        ));
    }

    let fields = parse_fields(&data[32..header_len])?;

    let used: usize = 1 + fields.iter().map(|f| f.length).sum::<usize>();
    if used > record_len {
        return Err(TigerError::parse_error(
            "DBF",
            format!("fields need {} bytes, record length is {}", used, record_len),
        ));
    }

    let body_len = data.len() - header_len;
    if num_records
        .checked_mul(record_len)
        .map_or(true, |needed| needed > body_len)
    {
        return Err(TigerError::parse_error(
            "DBF",
            format!(
                "{} records of {} bytes exceed file size",
                num_records, record_len
            ),
        ));
    }

    let mut records = Vec::with_capacity(num_records);
    for i in 0..num_records {
        let start = header_len + i * record_len;
        let record = data.get(start..start + record_len).ok_or_else(|| {
            TigerError::parse_error("DBF", format!("record {} truncated", i))
        })?;

        if record[0] == DELETED {
            records.push(None);
            continue;
        }

        let mut offset = 1;
        let mut values = Vec::with_capacity(fields.len());
        for field in &fields {
            let raw = &record[offset..offset + field.length];
            values.push(parse_value(field, raw, encoding));
            offset += field.length;
        }
        records.push(Some(values));
    }

    Ok(DbfTable { fields, records })
}

/// Parse les descripteurs de 32 bytes jusqu'au terminateur `0x0D`
fn parse_fields(descriptors: &[u8]) -> Result<Vec<Field>, TigerError> {
    let end = memchr(FIELD_TERMINATOR, descriptors).unwrap_or(descriptors.len());
    let mut fields = Vec::with_capacity(end / 32);

    for chunk in descriptors[..end].chunks(32) {
        if chunk.len() < 32 {
            return Err(TigerError::parse_error("DBF", "truncated field descriptor"));
        }

        let name_end = memchr(0, &chunk[..11]).unwrap_or(11);
        let name = String::from_utf8_lossy(&chunk[..name_end]).trim().to_string();

        let field_type = match chunk[11] {
            b'N' => FieldType::Numeric,
            b'F' => FieldType::Float,
            b'L' => FieldType::Logical,
            b'D' => FieldType::Date,
            _ => FieldType::Character,
        };

        fields.push(Field {
            name,
            field_type,
            length: chunk[16] as usize,
            decimals: chunk[17],
        });
    }

    Ok(fields)
}

/// Décode une valeur brute selon le type du champ
fn parse_value(field: &Field, raw: &[u8], encoding: &'static Encoding) -> Value {
    match field.field_type {
        FieldType::Character => {
            let text = decode(raw, encoding);
            let text = text.trim_end_matches([' ', '\0']);
            if text.is_empty() {
                Value::Null
            } else {
                Value::Text(text.to_string())
            }
        }
        FieldType::Numeric | FieldType::Float => {
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_matches([' ', '\0']);
            if text.is_empty() || text.bytes().all(|b| b == b'*') {
                return Value::Null;
            }
            if field.decimals == 0 {
                if let Ok(n) = text.parse::<i64>() {
                    return Value::Integer(n);
                }
            }
            match fast_float::parse::<f64, _>(text) {
                Ok(x) => Value::Float(x),
                Err(_) => Value::Null,
            }
        }
        FieldType::Logical => match raw.first() {
            Some(b'Y' | b'y' | b'T' | b't') => Value::Bool(true),
            Some(b'N' | b'n' | b'F' | b'f') => Value::Bool(false),
            _ => Value::Null,
        },
        FieldType::Date => {
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_matches([' ', '\0']);
            if text.is_empty() || text == "00000000" {
                Value::Null
            } else {
                Value::Text(text.to_string())
            }
        }
    }
}

/// Décode du texte; chemin rapide `simdutf8` pour l'UTF-8 valide
fn decode(raw: &[u8], encoding: &'static Encoding) -> String {
    if encoding == encoding_rs::UTF_8 {
        if let Ok(s) = simdutf8::basic::from_utf8(raw) {
            return s.to_string();
        }
    }
    let (decoded, _) = encoding.decode_without_bom_handling(raw);
    decoded.into_owned()
}
