use crate::models::Proxy;
use crate::utils::matcher::reg_find;

/// Evaluates one group selector against the node list and appends the
/// matching proxy names to `filtered`, deduplicating on first occurrence.
///
/// A selector of the form `[]name` includes `name` literally (including
/// the DIRECT/REJECT pseudo-proxies); anything else is a regex tested
/// against node remarks. `add_direct` controls whether literal selectors
/// are honored.
pub fn group_generate(
    selector: &str,
    nodelist: &[Proxy],
    filtered: &mut Vec<String>,
    add_direct: bool,
) {
    if let Some(literal) = selector.strip_prefix("[]") {
        if add_direct && !filtered.iter().any(|name| name == literal) {
            filtered.push(literal.to_string());
        }
        return;
    }

    for node in nodelist {
        if reg_find(&node.remark, selector) && !filtered.iter().any(|name| name == &node.remark) {
            filtered.push(node.remark.clone());
        }
    }
}
