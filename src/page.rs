//! Small HTML pages for device configuration UIs.
//!
//! ```
//! use wisp::Page;
//!
//! let mut page = Page::new("Wi-Fi");
//! page.form("/wifi/apply", "post", wisp::page::URLENCODED)
//!     .textbox("ssid", "SSID", "Home <5G>")
//!     .checkbox("dhcp", "DHCP", true)
//!     .submit("Save")
//!     .end_form();
//!
//! assert!(page.as_str().contains("value=\"Home &lt;5G&gt;\""));
//! assert!(!page.is_truncated());
//! ```

use core::fmt::{self, Write};

use heapless::String;

use crate::{Responder, Result};

/// Page buffer capacity in bytes.
pub const PAGE_CAPACITY: usize = 4096;

pub const URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART: &str = "multipart/form-data";

const STYLE: &str = "<style>\
    body{font-family:Arial,Helvetica,sans-serif;margin:20px;}\
    button{padding:10px;margin:5px;}\
    input,select{padding:5px;margin:5px;}\
    label{display:inline-block;width:100px;}\
    </style>";

const END: &str = "</body></html>";

/// Bounded HTML document builder.
///
/// Each widget is added whole or not at all. Once a widget does not fit, the
/// page is marked truncated and later widgets are dropped, room for the closing
/// tags is always kept.
pub struct Page {
    html: String<PAGE_CAPACITY>,
    truncated: bool,
}

impl Page {
    pub fn new(title: &str) -> Self {
        let mut page = Page {
            html: String::new(),
            truncated: false,
        };
        let title = Escaped(title);
        page.add(format_args!(
            "<html><head><title>{}</title>{}</head><body><h2>{}</h2>",
            title, STYLE, title
        ));
        page
    }

    pub fn heading(&mut self, text: &str) -> &mut Self {
        self.add(format_args!("<h3>{}</h3>", Escaped(text)))
    }

    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.add(format_args!("<p>{}</p>", Escaped(text)))
    }

    /// A button navigating to `href`.
    pub fn button(&mut self, href: &str, label: &str) -> &mut Self {
        self.add(format_args!(
            "<p><button onclick=\"location.href='{}'\">{}</button></p>",
            Escaped(href),
            Escaped(label)
        ))
    }

    pub fn form(&mut self, action: &str, method: &str, enctype: &str) -> &mut Self {
        self.add(format_args!(
            "<form action=\"{}\" method=\"{}\" enctype=\"{}\">",
            Escaped(action),
            Escaped(method),
            Escaped(enctype)
        ))
    }

    pub fn end_form(&mut self) -> &mut Self {
        self.add(format_args!("</form>"))
    }

    pub fn textbox(&mut self, name: &str, label: &str, value: &str) -> &mut Self {
        self.add(format_args!(
            "<label>{}</label><input type=\"text\" name=\"{}\" value=\"{}\"><br>",
            Escaped(label),
            Escaped(name),
            Escaped(value)
        ))
    }

    pub fn checkbox(&mut self, name: &str, label: &str, checked: bool) -> &mut Self {
        self.add(format_args!(
            "<label>{}</label><input type=\"checkbox\" name=\"{}\"{}><br>",
            Escaped(label),
            Escaped(name),
            if checked { " checked" } else { "" }
        ))
    }

    pub fn number(&mut self, name: &str, label: &str, value: i64) -> &mut Self {
        self.add(format_args!(
            "<label>{}</label><input type=\"number\" name=\"{}\" value=\"{}\"><br>",
            Escaped(label),
            Escaped(name),
            value
        ))
    }

    /// A drop-down whose option values are the option indexes.
    pub fn select(&mut self, name: &str, options: &[&str], selected: usize) -> &mut Self {
        self.add(format_args!(
            "<label>{}</label><select name=\"{}\">{}</select><br>",
            Escaped(name),
            Escaped(name),
            Options { options, selected }
        ))
    }

    pub fn file_input(&mut self, name: &str, label: &str) -> &mut Self {
        self.add(format_args!(
            "<label>{}</label><input type=\"file\" name=\"{}\"><br>",
            Escaped(label),
            Escaped(name)
        ))
    }

    /// Submit button for the enclosing form.
    pub fn submit(&mut self, label: &str) -> &mut Self {
        self.add(format_args!(
            "<input type=\"submit\" value=\"{}\">",
            Escaped(label)
        ))
    }

    /// Submit button in a form of its own, issuing a GET to `action`.
    pub fn submit_to(&mut self, action: &str, label: &str) -> &mut Self {
        self.add(format_args!(
            "<form action=\"{}\" method=\"get\"><input type=\"submit\" value=\"{}\"></form>",
            Escaped(action),
            Escaped(label)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Close the document and send it as `200 OK` `text/html`.
    pub fn finish(mut self, res: &mut Responder<'_>) -> Result<()> {
        if self.truncated {
            warn!("Page truncated at {} bytes", self.html.len());
        }
        // add() always leaves room for this.
        let _ = self.html.push_str(END);
        res.ok("text/html", self.html.as_bytes())
    }

    fn add(&mut self, args: fmt::Arguments<'_>) -> &mut Self {
        if self.truncated {
            return self;
        }

        let before = self.html.len();
        let fits = self.html.write_fmt(args).is_ok() && self.html.len() + END.len() <= PAGE_CAPACITY;

        if !fits {
            self.html.truncate(before);
            self.truncated = true;
        }

        self
    }
}

struct Options<'a> {
    options: &'a [&'a str],
    selected: usize,
}

impl<'a> fmt::Display for Options<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, o) in self.options.iter().enumerate() {
            let sel = if i == self.selected { " selected" } else { "" };
            write!(f, "<option value=\"{}\"{}>{}</option>", i, sel, Escaped(o))?;
        }
        Ok(())
    }
}

/// Html escapes the wrapped text when displayed.
pub struct Escaped<'a>(pub &'a str);

impl<'a> fmt::Display for Escaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '\'' => f.write_str("&apos;")?,
                '"' => f.write_str("&quot;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}
