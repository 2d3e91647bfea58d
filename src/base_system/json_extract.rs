use serde_json::Value;

pub type JsonMap = serde_json::Map<String, Value>;

/// 取第一个非空字段；数字字段按十进制文本返回。
pub fn pick_string(map: &JsonMap, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(val) = map.get(*key) {
            if let Some(s) = val.as_str() {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            } else if let Some(n) = val.as_i64() {
                return Some(n.to_string());
            } else if let Some(n) = val.as_u64() {
                return Some(n.to_string());
            } else if let Some(n) = val.as_f64()
                && n.is_finite()
            {
                return Some(n.to_string());
            }
        }
    }
    None
}

pub fn pick_f64(map: &JsonMap, keys: &[&str]) -> Option<f64> {
    for key in keys {
        if let Some(val) = map.get(*key) {
            if let Some(n) = val.as_f64() {
                return Some(n);
            }
            if let Some(s) = val.as_str()
                && let Ok(n) = s.trim().parse::<f64>()
            {
                return Some(n);
            }
        }
    }
    None
}

pub fn response_code(value: &Value) -> Option<i64> {
    let code = value.get("code")?;
    code.as_i64()
        .or_else(|| code.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
}
