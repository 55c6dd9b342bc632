use serde::Serialize;

use crate::error::Result;

/// HTMLエンコード（SVG/HTMLテキスト用）
pub fn html_encode(text: &str) -> String {
    text.replace("&", "&amp;")
        .replace("<", "&lt;")
        .replace(">", "&gt;")
        .replace("\"", "&quot;")
        .replace("'", "&#x27;")
}

/// 数値の表示用フォーマット（整数値は小数点なし）
pub fn fmt_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// `<script>`に埋め込むJSON（`</script>`で閉じられないよう`</`をエスケープ）
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_encode() {
        assert_eq!(html_encode("A & <B>"), "A &amp; &lt;B&gt;");
        assert_eq!(html_encode("l'été \"x\""), "l&#x27;été &quot;x&quot;");
    }

    #[test]
    fn test_fmt_number() {
        assert_eq!(fmt_number(10.0), "10");
        assert_eq!(fmt_number(-3.0), "-3");
        assert_eq!(fmt_number(2.5), "2.5");
        assert_eq!(fmt_number(1.0 / 3.0), "0.33");
    }

    #[test]
    fn test_script_json_escapes_closing_tags() {
        let s = script_json(&"<svg></svg></script>").unwrap();
        assert!(!s.contains("</"));
        let back: String = serde_json::from_str(&s).unwrap();
        assert_eq!(back, "<svg></svg></script>");
    }
}
