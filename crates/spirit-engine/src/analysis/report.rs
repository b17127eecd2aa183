//! HTML rendering of an analysis summary.

use super::{Analyzer, ColumnSort};

pub(crate) fn render(analyzer: &Analyzer) -> String {
    let mut html = String::new();
    html.push_str("<html><body>\n");
    html.push_str("<table border=\"1\" cellspacing=\"0\" cellpadding=\"2\">\n");
    html.push_str(
        "<tr><th>Column</th><th>N</th><th>Distribution</th><th>Groups</th><th>Kruskal-Wallis</th></tr>\n",
    );

    for column in analyzer.sorted_columns(ColumnSort::Significance) {
        html.push_str("<tr>");
        html.push_str(&format!("<td>{}</td>", escape_html(column.name())));
        html.push_str(&format!("<td>{}</td>", column.n()));
        html.push_str(&format!("<td>{}</td>", column.distribution().label()));
        html.push_str(&format!("<td>{}</td>", column.group_count()));
        match column.kruskal_wallis() {
            Some(kw) => {
                let p = format_p_value(kw.p_value);
                if kw.p_value < 0.05 {
                    html.push_str(&format!("<td><b>p={}</b></td>", escape_html(&p)));
                } else {
                    html.push_str(&format!("<td>p={}</td>", escape_html(&p)));
                }
            }
            None => html.push_str("<td>-</td>"),
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html.push_str("</body></html>\n");
    html
}

fn format_p_value(p: f64) -> String {
    if p < 0.0001 {
        "<0.0001".to_string()
    } else {
        format!("{p:.4}")
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn tiny_p_values_render_as_bound() {
        assert_eq!(format_p_value(0.00001), "<0.0001");
        assert_eq!(format_p_value(0.0317), "0.0317");
    }
}
