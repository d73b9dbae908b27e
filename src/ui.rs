use crate::config::SwitcherStyle;
use crate::host::{Frame, FrameEntry};
use gtk4::pango;
use gtk4::prelude::*;
use gtk4::{Application, ApplicationWindow, Box as GtkBox, Image, Label, Orientation};
use gtk4_layer_shell::{KeyboardMode, Layer, LayerShell};
use tracing::{debug, info, warn};

const ICON_SIZE: i32 = 24;
const ROW_HEIGHT: i32 = 48;
const WINDOW_PADDING: i32 = 24;
const WINDOW_WIDTH: i32 = 480;
const MAX_TITLE_CHARS: i32 = 48;

/// Overlay listing one row (icon + title) per window of the cycle list.
pub struct SwitcherWindow {
    window: ApplicationWindow,
    container: GtkBox,
}

impl SwitcherWindow {
    pub fn new(app: &Application, output: &str) -> Self {
        let window = ApplicationWindow::builder()
            .application(app)
            .title("Window Switcher")
            .default_width(WINDOW_WIDTH)
            .decorated(false)
            .resizable(false)
            .build();

        // Keyboard stays with the compositor so modifier releases reach sway
        window.init_layer_shell();
        window.set_layer(Layer::Overlay);
        window.set_namespace("sway-switcher");
        window.set_keyboard_mode(KeyboardMode::None);
        if let Some(monitor) = find_monitor(output) {
            window.set_monitor(&monitor);
        } else {
            warn!("No GDK monitor for output {}, using the default", output);
        }

        let container = GtkBox::new(Orientation::Vertical, 0);
        container.set_margin_start(WINDOW_PADDING);
        container.set_margin_end(WINDOW_PADDING);
        container.set_margin_top(WINDOW_PADDING);
        container.set_margin_bottom(WINDOW_PADDING);

        window.set_child(Some(&container));

        SwitcherWindow { window, container }
    }

    /// Rebuild the rows from `frame` and make sure the overlay is visible.
    pub fn redraw(&self, frame: &Frame) {
        while let Some(child) = self.container.first_child() {
            self.container.remove(&child);
        }

        let font = pango::FontDescription::from_string(&frame.style.font);
        for (i, entry) in frame.entries.iter().enumerate() {
            let row = create_row(entry, &font, i == frame.selected);
            self.container.append(&row);
        }

        self.window
            .set_default_size(WINDOW_WIDTH, frame.entries.len() as i32 * ROW_HEIGHT + WINDOW_PADDING);
        if !self.window.is_visible() {
            self.window.present();
        }
        debug!("Drew {} rows, selected {}", frame.entries.len(), frame.selected);
    }

    pub fn destroy(&self) {
        self.window.set_visible(false);
        self.window.destroy();
    }
}

fn create_row(entry: &FrameEntry, font: &pango::FontDescription, selected: bool) -> GtkBox {
    let row = GtkBox::new(Orientation::Horizontal, ICON_SIZE);
    row.set_height_request(ROW_HEIGHT);

    let icon = Image::from_file(&entry.icon);
    icon.set_pixel_size(ICON_SIZE);
    row.append(&icon);

    let attrs = pango::AttrList::new();
    attrs.insert(pango::AttrFontDesc::new(font));
    let weight = if selected {
        pango::Weight::Bold
    } else {
        pango::Weight::Normal
    };
    attrs.insert(pango::AttrInt::new_weight(weight));

    let label = Label::new(Some(&entry.title));
    label.set_attributes(Some(&attrs));
    label.set_ellipsize(pango::EllipsizeMode::End);
    label.set_max_width_chars(MAX_TITLE_CHARS);
    label.set_xalign(0.0);
    row.append(&label);

    if selected {
        row.add_css_class("selected");
    }
    row
}

fn find_monitor(output: &str) -> Option<gtk4::gdk::Monitor> {
    let display = gtk4::gdk::Display::default()?;
    let monitors = display.monitors();
    (0..monitors.n_items())
        .filter_map(|i| monitors.item(i))
        .filter_map(|item| item.downcast::<gtk4::gdk::Monitor>().ok())
        .find(|monitor| monitor.connector().as_deref() == Some(output))
}

/// Stylesheet for the switcher colors.
pub fn stylesheet(style: &SwitcherStyle) -> String {
    format!(
        r#"
        window {{
            background-color: {background};
            border-radius: 10px;
        }}

        box {{
            background-color: transparent;
        }}

        label {{
            color: {text};
        }}
        "#,
        background = style.background_color.to_css(),
        text = style.text_color.to_css(),
    )
}

/// Install the stylesheet on the default display.
pub fn apply_style(provider: &gtk4::CssProvider, style: &SwitcherStyle) {
    provider.load_from_data(&stylesheet(style));
    info!("Applied switcher style");
}

pub fn install_css_provider() -> Option<gtk4::CssProvider> {
    let provider = gtk4::CssProvider::new();
    let Some(display) = gtk4::gdk::Display::default() else {
        warn!("No default display, switcher will be unstyled");
        return None;
    };
    gtk4::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
    Some(provider)
}
