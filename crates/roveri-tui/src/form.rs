/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl FormField {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: false,
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: true,
        }
    }

    pub fn display_value(&self) -> String {
        if self.secret {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// A vertical list of single-line inputs with one focused field and a cursor.
#[derive(Debug, Clone)]
pub struct FormState {
    pub fields: Vec<FormField>,
    pub focused: usize,
    pub cursor: usize,
}

impl FormState {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self {
            fields,
            focused: 0,
            cursor: 0,
        }
    }

    pub fn login() -> Self {
        Self::new(vec![FormField::text("Email"), FormField::secret("Password")])
    }

    pub fn register() -> Self {
        Self::new(vec![
            FormField::text("Name"),
            FormField::text("Email"),
            FormField::text("Phone"),
            FormField::text("City"),
            FormField::secret("Password"),
            FormField::secret("Confirm password"),
        ])
    }

    pub fn new_pet() -> Self {
        let mut form = Self::new(vec![
            FormField::text("Name"),
            FormField::text("Species (dog/cat)"),
            FormField::text("Breed"),
            FormField::text("Age"),
            FormField::text("City"),
            FormField::text("Description"),
            FormField::text("Image file (optional)"),
        ]);
        form.fields[1].value = "dog".to_string();
        form
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.as_str())
            .unwrap_or_default()
    }

    pub fn is_last_field(&self) -> bool {
        self.focused + 1 >= self.fields.len()
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
            self.cursor_to_end();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focused = self.focused.checked_sub(1).unwrap_or(self.fields.len() - 1);
            self.cursor_to_end();
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor;
        if let Some(field) = self.fields.get_mut(self.focused) {
            let byte_idx = char_to_byte_index(&field.value, cursor);
            field.value.insert(byte_idx, c);
            self.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let cursor = self.cursor;
        if let Some(field) = self.fields.get_mut(self.focused) {
            let byte_idx = char_to_byte_index(&field.value, cursor - 1);
            field.value.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let len = self.focused_len();
        self.cursor = (self.cursor + 1).min(len);
    }

    /// Clear secrets, keep the rest for a retry.
    pub fn clear_secrets(&mut self) {
        for field in self.fields.iter_mut().filter(|field| field.secret) {
            field.value.clear();
        }
        self.cursor_to_end();
    }

    pub fn reset(&mut self, fresh: FormState) {
        *self = fresh;
    }

    fn cursor_to_end(&mut self) {
        self.cursor = self.focused_len();
    }

    fn focused_len(&self) -> usize {
        self.fields
            .get(self.focused)
            .map(|field| field.value.chars().count())
            .unwrap_or(0)
    }
}

/// Single-line text input with a character cursor, used for search and chat.
#[derive(Debug, Clone, Default)]
pub struct LineInput {
    pub value: String,
    pub cursor: usize,
}

impl LineInput {
    pub fn insert_char(&mut self, c: char) {
        let byte_idx = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = char_to_byte_index(&self.value, self.cursor - 1);
            self.value.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_is_utf8_safe() {
        let mut form = FormState::login();
        for c in "são".chars() {
            form.insert_char(c);
        }
        form.cursor_left();
        form.backspace();
        assert_eq!(form.value(0), "so");
    }

    #[test]
    fn field_navigation_wraps() {
        let mut form = FormState::login();
        assert!(!form.is_last_field());
        form.next_field();
        assert!(form.is_last_field());
        form.next_field();
        assert_eq!(form.focused, 0);
        form.prev_field();
        assert_eq!(form.focused, 1);
    }

    #[test]
    fn secrets_are_masked_and_cleared() {
        let mut form = FormState::login();
        form.next_field();
        for c in "hunter2".chars() {
            form.insert_char(c);
        }
        assert_eq!(form.fields[1].display_value(), "*******");
        form.clear_secrets();
        assert_eq!(form.value(1), "");
        assert_eq!(form.cursor, 0);
    }

    #[test]
    fn line_input_take_resets() {
        let mut input = LineInput::default();
        input.insert_char('o');
        input.insert_char('i');
        assert_eq!(input.take(), "oi");
        assert_eq!(input.cursor, 0);
        assert!(input.value.is_empty());
    }
}
