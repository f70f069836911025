use std::borrow::Cow;
use std::collections::BTreeMap;

/// Tabla class_id -> nombre. Si el modelo no trae nombres se usa el número.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    names: BTreeMap<u32, String>,
}

impl LabelSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(i, n)| (i as u32, n.into()))
                .collect(),
        }
    }

    /// Interpreta el metadato `names` que Ultralytics guarda en el ONNX:
    /// `{0: 'person', 1: 'bicycle', ...}`. Las entradas mal formadas se ignoran.
    pub fn from_ultralytics_metadata(raw: &str) -> Self {
        let mut names = BTreeMap::new();
        let mut chars = raw.trim().trim_start_matches('{').trim_end_matches('}').chars().peekable();

        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace() || *c == ',') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            let key: String = chars.by_ref().take_while(|c| *c != ':').collect();
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }

            let value = match chars.next() {
                Some(quote @ ('\'' | '"')) => {
                    let mut value = String::new();
                    let mut escaped = false;
                    for c in chars.by_ref() {
                        if escaped {
                            value.push(c);
                            escaped = false;
                        } else if c == '\\' {
                            escaped = true;
                        } else if c == quote {
                            break;
                        } else {
                            value.push(c);
                        }
                    }
                    value
                }
                Some(first) => {
                    let rest: String = chars.by_ref().take_while(|c| *c != ',').collect();
                    format!("{first}{rest}").trim().to_string()
                }
                None => break,
            };

            if let Ok(id) = key.trim().parse::<u32>() {
                names.insert(id, value);
            }
        }

        Self { names }
    }

    pub fn name(&self, class_id: u32) -> Cow<'_, str> {
        match self.names.get(&class_id) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(class_id.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
