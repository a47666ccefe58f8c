use weatherapp_core::{IconView, Widgets};

pub fn render(widgets: &Widgets) {
    print!("{}", format_widgets(widgets));
}

fn format_widgets(widgets: &Widgets) -> String {
    if widgets.temperature.is_empty() && widgets.description.is_empty() {
        return "No weather to show yet. Search for a city.\n".to_string();
    }

    let icon = match &widgets.icon {
        IconView::Empty => "-".to_string(),
        IconView::Loading { url } => format!("{url} (loading)"),
        IconView::Loaded { url, image } => format!("{url} ({} bytes)", image.len()),
        IconView::Failed { url } => format!("{url} (unavailable)"),
    };

    format!(
        "City:        {}\nTemperature: {}\nDescription: {}\nIcon:        {}\n",
        widgets.city_input, widgets.temperature, widgets.description, icon,
    )
}
