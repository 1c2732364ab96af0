use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    rc::Rc,
};

use geo_types::Rect;

use crate::{
    data_types::{
        common::LatLng,
        route::RouteStyle,
        workout::{Workout, WorkoutType},
    },
    engine::collection::SortCriterion,
    errors::CommandError,
};

use super::{
    EntryMark, FormInput, GeolocationDenied, ListAction, ListPosition, MarkerHandle, MessageKind,
    Presentation, RouteHandle, UiEvent,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadMap(LatLng, u8),
    Notify(String),
    RenderMarker(MarkerHandle, String),
    UpdateMarker(MarkerHandle, String),
    RemoveMarker(MarkerHandle),
    RenderListEntry(ListPosition),
    ClearList,
    DrawRoute(RouteHandle, usize, RouteStyle),
    RestyleRoute(RouteHandle, RouteStyle),
    RemoveRoute(RouteHandle),
    UpdatePreview(usize),
    ShowForm,
    HideForm,
    FillForm(FormInput),
    TypeSelectorEnabled(bool),
    MarkEntry(usize, EntryMark),
    ClearMarks,
    ShowMessage(MessageKind),
    ShowControls(bool),
    SetView(LatLng, u8),
    FitBounds(Rect),
}

/// What a real widget would currently be showing, reconstructed from the commands.
#[derive(Debug, Default)]
pub struct Screen {
    pub commands: Vec<Command>,
    pub list: VecDeque<String>,
    /// popup content per live marker
    pub markers: BTreeMap<MarkerHandle, String>,
    /// hover line of markers whose weather is known
    pub weather: BTreeMap<MarkerHandle, String>,
    pub routes: BTreeMap<RouteHandle, (Vec<LatLng>, RouteStyle)>,
    pub preview: Vec<LatLng>,
    pub marks: Vec<(usize, EntryMark)>,
    pub form_visible: bool,
    pub type_selector_enabled: bool,
    pub controls_visible: bool,
    pub messages: Vec<MessageKind>,
    pub notices: Vec<String>,
    pub map_center: Option<LatLng>,
    next_handle: u64,
}

impl Screen {
    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

/// A presentation without widgets. It keeps a [`Screen`] that tests and the
/// terminal driver inspect through the shared handle from [`HeadlessPresentation::screen`].
pub struct HeadlessPresentation {
    screen: Rc<RefCell<Screen>>,
    echo: bool,
}

impl HeadlessPresentation {
    pub fn new() -> Self {
        Self {
            screen: Rc::new(RefCell::new(Screen {
                type_selector_enabled: true,
                ..Default::default()
            })),
            echo: false,
        }
    }

    /// Prints every command to stdout as it is issued.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..HeadlessPresentation::new()
        }
    }

    pub fn screen(&self) -> Rc<RefCell<Screen>> {
        Rc::clone(&self.screen)
    }

    fn show_weather(&self, handle: MarkerHandle, workout: &Workout) {
        if let Some(line) = workout.weather_summary() {
            self.screen.borrow_mut().weather.insert(handle, line);
        }
    }

    fn record(&self, command: Command) {
        if self.echo {
            println!("{:?}", command);
        }

        self.screen.borrow_mut().commands.push(command);
    }
}

impl Default for HeadlessPresentation {
    fn default() -> Self {
        HeadlessPresentation::new()
    }
}

impl Presentation for HeadlessPresentation {
    fn load_map(&mut self, center: LatLng, zoom: u8) {
        self.screen.borrow_mut().map_center = Some(center);
        self.record(Command::LoadMap(center, zoom));
    }

    fn notify(&mut self, notice: &str) {
        self.screen.borrow_mut().notices.push(notice.to_string());
        self.record(Command::Notify(notice.to_string()));
    }

    fn render_marker(&mut self, workout: &Workout) -> MarkerHandle {
        let handle = MarkerHandle(self.screen.borrow_mut().next_handle());
        let content = workout.popup_content().to_string();

        self.screen.borrow_mut().markers.insert(handle, content.clone());
        self.show_weather(handle, workout);
        self.record(Command::RenderMarker(handle, content));

        handle
    }

    fn update_marker(&mut self, handle: MarkerHandle, workout: &Workout) {
        let content = workout.popup_content().to_string();

        if let Some(popup) = self.screen.borrow_mut().markers.get_mut(&handle) {
            *popup = content.clone();
        }
        self.show_weather(handle, workout);
        self.record(Command::UpdateMarker(handle, content));
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        {
            let mut screen = self.screen.borrow_mut();
            screen.markers.remove(&handle);
            screen.weather.remove(&handle);
        }
        self.record(Command::RemoveMarker(handle));
    }

    fn render_list_entry(&mut self, markup: &str, position: ListPosition) {
        {
            let mut screen = self.screen.borrow_mut();
            match position {
                ListPosition::Prepend => screen.list.push_front(markup.to_string()),
                ListPosition::Append => screen.list.push_back(markup.to_string()),
            }
        }
        self.record(Command::RenderListEntry(position));
    }

    fn clear_list(&mut self) {
        self.screen.borrow_mut().list.clear();
        self.record(Command::ClearList);
    }

    fn draw_route(&mut self, points: &[LatLng], style: RouteStyle) -> RouteHandle {
        let handle = RouteHandle(self.screen.borrow_mut().next_handle());

        self.screen
            .borrow_mut()
            .routes
            .insert(handle, (points.to_vec(), style));
        self.record(Command::DrawRoute(handle, points.len(), style));

        handle
    }

    fn restyle_route(&mut self, handle: RouteHandle, style: RouteStyle) {
        if let Some(route) = self.screen.borrow_mut().routes.get_mut(&handle) {
            route.1 = style;
        }
        self.record(Command::RestyleRoute(handle, style));
    }

    fn remove_route(&mut self, handle: RouteHandle) {
        self.screen.borrow_mut().routes.remove(&handle);
        self.record(Command::RemoveRoute(handle));
    }

    fn update_preview(&mut self, points: &[LatLng]) {
        self.screen.borrow_mut().preview = points.to_vec();
        self.record(Command::UpdatePreview(points.len()));
    }

    fn show_form(&mut self) {
        self.screen.borrow_mut().form_visible = true;
        self.record(Command::ShowForm);
    }

    fn hide_form(&mut self) {
        self.screen.borrow_mut().form_visible = false;
        self.record(Command::HideForm);
    }

    fn fill_form(&mut self, values: &FormInput) {
        self.record(Command::FillForm(*values));
    }

    fn set_type_selector_enabled(&mut self, enabled: bool) {
        self.screen.borrow_mut().type_selector_enabled = enabled;
        self.record(Command::TypeSelectorEnabled(enabled));
    }

    fn mark_entry(&mut self, position: usize, mark: EntryMark) {
        self.screen.borrow_mut().marks.push((position, mark));
        self.record(Command::MarkEntry(position, mark));
    }

    fn clear_marks(&mut self) {
        self.screen.borrow_mut().marks.clear();
        self.record(Command::ClearMarks);
    }

    fn show_message(&mut self, kind: MessageKind) {
        self.screen.borrow_mut().messages.push(kind);
        self.record(Command::ShowMessage(kind));
    }

    fn show_controls(&mut self, visible: bool) {
        self.screen.borrow_mut().controls_visible = visible;
        self.record(Command::ShowControls(visible));
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.screen.borrow_mut().map_center = Some(center);
        self.record(Command::SetView(center, zoom));
    }

    fn fit_bounds(&mut self, bounds: Rect) {
        self.record(Command::FitBounds(bounds));
    }
}

/// Reads one line of the terminal driver. Blank lines and `#` comments yield `None`.
pub fn parse_event(line: &str) -> Result<Option<UiEvent>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match command {
        _ if command.starts_with('#') => return Ok(None),
        "locate" => match args.as_slice() {
            [] => UiEvent::Located(Err(GeolocationDenied)),
            [lat, lng] => UiEvent::Located(Ok(parse_latlng("locate", lat, lng)?)),
            _ => return Err(arguments("locate", "nothing or <lat> <lng>")),
        },
        "click" => match args.as_slice() {
            [lat, lng] => UiEvent::MapClick(parse_latlng("click", lat, lng)?),
            _ => return Err(arguments("click", "<lat> <lng>")),
        },
        "enter" => UiEvent::CommitKey,
        "submit" => match args.as_slice() {
            [kind, distance, duration, extra] => {
                let distance = FormInput::parse_number(distance);
                let duration = FormInput::parse_number(duration);
                let extra = FormInput::parse_number(extra);

                let form = match kind.parse::<WorkoutType>() {
                    Ok(WorkoutType::Running) => FormInput::running(distance, duration, extra),
                    Ok(WorkoutType::Cycling) => FormInput::cycling(distance, duration, extra),
                    Err(_) => return Err(arguments("submit", "running or cycling")),
                };
                UiEvent::FormSubmit(form)
            }
            _ => {
                return Err(arguments(
                    "submit",
                    "<running|cycling> <distance> <duration> <cadence|elevation>",
                ))
            }
        },
        "focus" | "edit" | "delete" => {
            let (name, action) = match command {
                "focus" => ("focus", ListAction::Focus),
                "edit" => ("edit", ListAction::Edit),
                _ => ("delete", ListAction::Delete),
            };

            match args.as_slice() {
                [position] => UiEvent::ListItemClick {
                    position: position
                        .parse()
                        .map_err(|_| arguments(name, "a list position"))?,
                    action,
                },
                _ => return Err(arguments(name, "a list position")),
            }
        }
        "sort" => match args.as_slice() {
            ["distance"] => UiEvent::SortButtonClick(SortCriterion::Distance),
            ["duration"] => UiEvent::SortButtonClick(SortCriterion::Duration),
            _ => return Err(arguments("sort", "distance or duration")),
        },
        "zoom" => UiEvent::ZoomAllClick,
        "clear" => UiEvent::ClearAllClick,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(event))
}

fn parse_latlng(command: &'static str, lat: &str, lng: &str) -> Result<LatLng, CommandError> {
    match (lat.parse(), lng.parse()) {
        (Ok(lat), Ok(lng)) => Ok([lat, lng]),
        _ => Err(arguments(command, "numeric <lat> <lng>")),
    }
}

fn arguments(command: &'static str, expected: &'static str) -> CommandError {
    CommandError::Arguments { command, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepend_puts_newest_on_top() {
        let mut presentation = HeadlessPresentation::new();
        let screen = presentation.screen();

        presentation.render_list_entry("first", ListPosition::Prepend);
        presentation.render_list_entry("second", ListPosition::Prepend);
        presentation.render_list_entry("last", ListPosition::Append);

        assert_eq!(screen.borrow().list, ["second", "first", "last"]);
    }

    #[test]
    fn handles_are_unique_and_removal_is_tracked() {
        let mut presentation = HeadlessPresentation::new();
        let screen = presentation.screen();

        let a = presentation.draw_route(&[[1.0, 1.0]], RouteStyle::preview());
        let b = presentation.draw_route(&[[2.0, 2.0]], RouteStyle::pending());
        assert_ne!(a, b);

        presentation.remove_route(a);
        assert_eq!(screen.borrow().routes.len(), 1);
        assert!(screen.borrow().routes.contains_key(&b));
    }

    #[test]
    fn marker_refresh_shows_weather_once_known() {
        use crate::data_types::workout::WeatherSnapshot;
        use chrono::{Local, TimeZone};

        let mut presentation = HeadlessPresentation::new();
        let screen = presentation.screen();
        let mut workout = Workout::running(
            "0000000005".to_string(),
            [47.0, 28.8],
            5.0,
            30.0,
            150.0,
            Local.with_ymd_and_hms(2024, 5, 2, 7, 0, 0).unwrap(),
        );

        let handle = presentation.render_marker(&workout);
        assert!(screen.borrow().weather.is_empty());

        workout.weather = Some(WeatherSnapshot {
            temperature_c: 21.0,
            wind_speed: 3.0,
            humidity_pct: 40.0,
        });
        presentation.update_marker(handle, &workout);
        assert_eq!(
            screen.borrow().weather.get(&handle).map(String::as_str),
            Some("21 ℃, 3 m/s, 40%")
        );

        presentation.remove_marker(handle);
        assert!(screen.borrow().weather.is_empty());
    }

    #[test]
    fn parses_driver_lines() {
        assert_eq!(parse_event("  "), Ok(None));
        assert_eq!(parse_event("# setup"), Ok(None));
        assert_eq!(
            parse_event("click 47.01 28.85"),
            Ok(Some(UiEvent::MapClick([47.01, 28.85])))
        );
        assert_eq!(
            parse_event("locate"),
            Ok(Some(UiEvent::Located(Err(GeolocationDenied))))
        );
        assert!(matches!(
            parse_event("submit cycling 20 60 300"),
            Ok(Some(UiEvent::FormSubmit(FormInput {
                workout_type: WorkoutType::Cycling,
                elevation_gain,
                ..
            }))) if elevation_gain == 300.0
        ));
        assert_eq!(
            parse_event("delete 2"),
            Ok(Some(UiEvent::ListItemClick {
                position: 2,
                action: ListAction::Delete
            }))
        );
        assert_eq!(
            parse_event("sort duration"),
            Ok(Some(UiEvent::SortButtonClick(SortCriterion::Duration)))
        );
    }

    #[test]
    fn unparsable_form_numbers_reach_validation() {
        let Ok(Some(UiEvent::FormSubmit(form))) = parse_event("submit running x 30 150") else {
            panic!("expected a form submission");
        };

        assert!(form.distance.is_nan());
        assert_eq!(form.cadence, 150.0);
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(
            parse_event("jump"),
            Err(CommandError::Unknown("jump".to_string()))
        );
        assert!(matches!(
            parse_event("click 1"),
            Err(CommandError::Arguments { command: "click", .. })
        ));
        assert!(matches!(
            parse_event("submit swimming 1 1 1"),
            Err(CommandError::Arguments { command: "submit", .. })
        ));
        assert!(matches!(
            parse_event("edit top"),
            Err(CommandError::Arguments { command: "edit", .. })
        ));
    }
}
