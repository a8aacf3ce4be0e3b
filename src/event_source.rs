use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::selection::{Point, PointerEvent};

/// A pointer event addressed to one page surface (1-indexed)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageEvent {
    pub page: usize,
    pub event: PointerEvent,
}

impl PageEvent {
    pub fn new(page: usize, event: PointerEvent) -> Self {
        Self { page, event }
    }
}

/// Trait for abstracting pointer input so gestures can be replayed in tests
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<PageEvent>;
}

/// Replays a fixed list of pointer events
pub struct ScriptedEventSource {
    pub(crate) events: Vec<PageEvent>,
    current_index: usize,
}

impl ScriptedEventSource {
    pub fn new(events: Vec<PageEvent>) -> Self {
        Self {
            events,
            current_index: 0,
        }
    }

    /// Build a source from gesture strings such as `2:10,10:50,80`
    pub fn from_gestures<I, T>(gestures: I) -> Result<Self, GestureParseError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut events = Vec::new();
        for raw in gestures {
            let gesture: Gesture = raw.as_ref().parse()?;
            events.extend(gesture.events());
        }
        Ok(Self::new(events))
    }
}

impl EventSource for ScriptedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(self.current_index < self.events.len())
    }

    fn read(&mut self) -> Result<PageEvent> {
        let event = self
            .events
            .get(self.current_index)
            .copied()
            .ok_or_else(|| anyhow!("no more pointer events"))?;
        self.current_index += 1;
        Ok(event)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GestureParseError {
    #[error("empty gesture")]
    Empty,
    #[error("invalid page number '{0}'")]
    InvalidPage(String),
    #[error("invalid point '{0}', expected X,Y")]
    InvalidPoint(String),
    #[error("gesture on page {0} has no points")]
    NoPoints(usize),
}

/// One drag gesture on a page: `PAGE:X,Y[:X,Y...][:leave]`.
///
/// The first point presses, the last releases and anything in between moves.
/// A trailing `leave` swaps the release for the pointer leaving the page.
#[derive(Clone, Debug, PartialEq)]
pub struct Gesture {
    pub page: usize,
    pub points: Vec<Point>,
    pub leave: bool,
}

impl Gesture {
    pub fn events(&self) -> Vec<PageEvent> {
        let Some((first, rest)) = self.points.split_first() else {
            return Vec::new();
        };

        let mut events = vec![PageEvent::new(self.page, PointerEvent::Down(*first))];
        if self.leave {
            events.extend(
                rest.iter()
                    .map(|p| PageEvent::new(self.page, PointerEvent::Move(*p))),
            );
            events.push(PageEvent::new(self.page, PointerEvent::Leave));
            return events;
        }

        let (last, middle): (&Point, &[Point]) = match rest.split_last() {
            Some((last, middle)) => (last, middle),
            None => (first, &[]),
        };
        events.extend(
            middle
                .iter()
                .map(|p| PageEvent::new(self.page, PointerEvent::Move(*p))),
        );
        events.push(PageEvent::new(self.page, PointerEvent::Up(*last)));
        events
    }
}

impl FromStr for Gesture {
    type Err = GestureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GestureParseError::Empty);
        }

        let mut parts = s.split(':');
        let page_part = parts.next().unwrap_or_default().trim();
        let page = page_part
            .parse::<usize>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| GestureParseError::InvalidPage(page_part.to_string()))?;

        let mut points = Vec::new();
        let mut leave = false;
        for part in parts {
            let part = part.trim();
            if leave {
                // `leave` must be the last segment
                return Err(GestureParseError::InvalidPoint(part.to_string()));
            }
            if part.eq_ignore_ascii_case("leave") {
                leave = true;
                continue;
            }
            points.push(parse_point(part)?);
        }

        if points.is_empty() {
            return Err(GestureParseError::NoPoints(page));
        }
        Ok(Self {
            page,
            points,
            leave,
        })
    }
}

fn parse_point(s: &str) -> Result<Point, GestureParseError> {
    let invalid = || GestureParseError::InvalidPoint(s.to_string());
    let (x, y) = s.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<f32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<f32>().map_err(|_| invalid())?;
    if !x.is_finite() || !y.is_finite() {
        return Err(invalid());
    }
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(x: f32, y: f32) -> PointerEvent {
        PointerEvent::Down(Point::new(x, y))
    }

    #[test]
    fn test_scripted_event_source() {
        let mut source = ScriptedEventSource::new(vec![
            PageEvent::new(1, down(1.0, 2.0)),
            PageEvent::new(1, PointerEvent::Leave),
        ]);

        assert!(source.poll(Duration::from_millis(0)).unwrap());
        assert_eq!(source.read().unwrap().event, down(1.0, 2.0));
        assert_eq!(source.read().unwrap().event, PointerEvent::Leave);

        assert!(!source.poll(Duration::from_millis(0)).unwrap());
        assert!(source.read().is_err());
    }

    #[test]
    fn drag_gesture_expands_to_down_moves_up() {
        let gesture: Gesture = "2:10,10:30,40:50,80".parse().unwrap();
        let events: Vec<PointerEvent> = gesture.events().iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                down(10.0, 10.0),
                PointerEvent::Move(Point::new(30.0, 40.0)),
                PointerEvent::Up(Point::new(50.0, 80.0)),
            ]
        );
        assert!(gesture.events().iter().all(|e| e.page == 2));
    }

    #[test]
    fn single_point_is_a_click() {
        let gesture: Gesture = "1: 5 , 6".parse().unwrap();
        let events: Vec<PointerEvent> = gesture.events().iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![down(5.0, 6.0), PointerEvent::Up(Point::new(5.0, 6.0))]
        );
    }

    #[test]
    fn trailing_leave_replaces_release() {
        let gesture: Gesture = "3:0,0:20,20:leave".parse().unwrap();
        let events: Vec<PointerEvent> = gesture.events().iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                down(0.0, 0.0),
                PointerEvent::Move(Point::new(20.0, 20.0)),
                PointerEvent::Leave,
            ]
        );
    }

    #[test]
    fn malformed_gestures_are_rejected() {
        assert_eq!("".parse::<Gesture>(), Err(GestureParseError::Empty));
        assert_eq!(
            "0:1,1".parse::<Gesture>(),
            Err(GestureParseError::InvalidPage("0".into()))
        );
        assert_eq!(
            "x:1,1".parse::<Gesture>(),
            Err(GestureParseError::InvalidPage("x".into()))
        );
        assert_eq!("2".parse::<Gesture>(), Err(GestureParseError::NoPoints(2)));
        assert_eq!(
            "2:1;1".parse::<Gesture>(),
            Err(GestureParseError::InvalidPoint("1;1".into()))
        );
        assert_eq!(
            "2:1,1:leave:3,3".parse::<Gesture>(),
            Err(GestureParseError::InvalidPoint("3,3".into()))
        );
    }

    #[test]
    fn from_gestures_concatenates_in_order() {
        let mut source = ScriptedEventSource::from_gestures(["1:1,1", "2:2,2"]).unwrap();
        assert_eq!(source.events.len(), 4);
        assert_eq!(source.read().unwrap().page, 1);
        assert_eq!(source.read().unwrap().page, 1);
        assert_eq!(source.read().unwrap().page, 2);
    }
}
