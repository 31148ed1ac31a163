//! Pointer input and the drag state machine that turns it into scroll deltas.
//!
//! ## Usage
//!
//! Hosts translate their native touch or mouse events into [`PointerEvent`]s
//! and feed them to [`StreamPager::on_pointer_event`](crate::StreamPager::on_pointer_event).
//! The returned [`GestureDisposition`] tells the host whether the pager owns
//! the gesture or whether it should be forwarded to nested content.

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::velocity::VelocityTracker;

/// One touch point or cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Identifier that stays stable for as long as the pointer is down.
    pub id: u64,
    /// Horizontal position in pager-local pixels.
    pub x: f32,
    /// Vertical position in pager-local pixels.
    pub y: f32,
}

/// What happened to the pointers of a [`PointerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// The first pointer touched down.
    Down,
    /// One or more pointers moved.
    Move,
    /// The last pointer lifted.
    Up,
    /// The host took the gesture away.
    Cancel,
    /// An additional pointer touched down.
    PointerDown(u64),
    /// A pointer lifted while others stay down.
    PointerUp(u64),
}

/// A pointer event in pager-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// The action.
    pub action: PointerAction,
    /// Every pointer that is down, including the one the action refers to.
    pub pointers: SmallVec<[Pointer; 2]>,
    /// Monotonic event time.
    pub time_nanos: u64,
}

impl PointerEvent {
    /// Looks up a pointer by id.
    pub fn pointer(&self, id: u64) -> Option<&Pointer> {
        self.pointers.iter().find(|pointer| pointer.id == id)
    }

    /// The pointer the action refers to: the new or lifted pointer for
    /// `PointerDown`/`PointerUp`, the first pointer otherwise.
    pub fn acting_pointer(&self) -> Option<&Pointer> {
        match self.action {
            PointerAction::PointerDown(id) | PointerAction::PointerUp(id) => self.pointer(id),
            _ => self.pointers.first(),
        }
    }
}

/// Whether the pager owns the current gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureDisposition {
    /// The pager is dragging; the host should not forward the gesture.
    Claimed,
    /// The pager has not decided yet.
    Undecided,
    /// The gesture belongs to someone else.
    PassedThrough,
}

/// Phase of the drag state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    /// No pointer is down.
    #[default]
    Idle,
    /// A pointer is down but has not moved past the touch slop.
    Undetermined,
    /// The pager follows the active pointer.
    Dragging,
    /// The gesture was handed to nested content or rejected as vertical.
    NotDragging,
}

impl GesturePhase {
    /// Maps the phase onto what the host should do with the gesture.
    pub fn disposition(self) -> GestureDisposition {
        match self {
            GesturePhase::Dragging => GestureDisposition::Claimed,
            GesturePhase::Undetermined => GestureDisposition::Undecided,
            GesturePhase::Idle | GesturePhase::NotDragging => GestureDisposition::PassedThrough,
        }
    }
}

/// Probe for nested content that can scroll horizontally.
pub trait NestedScroll {
    /// Whether content under `(x, y)` can scroll by `dx` pixels of finger
    /// movement. Positive `dx` means the finger moved right, so the content
    /// would need to scroll toward its start.
    fn can_scroll(&self, dx: f32, x: f32, y: f32) -> bool;
}

impl<F> NestedScroll for F
where
    F: Fn(f32, f32, f32) -> bool,
{
    fn can_scroll(&self, dx: f32, x: f32, y: f32) -> bool {
        self(dx, x, y)
    }
}

/// A rectangle of nested content with its own horizontal scroll range.
///
/// The root region stands for the pager's page area: only its children are
/// tested, last child first, and each child is tested innermost-first before
/// the child itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollRegion {
    /// Left edge in the parent's content coordinates.
    pub left: f32,
    /// Top edge in the parent's content coordinates.
    pub top: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Current horizontal scroll of this region's content.
    pub scroll_x: f32,
    /// Current vertical scroll of this region's content.
    pub scroll_y: f32,
    /// Whether the content can still scroll toward its start.
    pub can_scroll_backward: bool,
    /// Whether the content can still scroll toward its end.
    pub can_scroll_forward: bool,
    /// Child regions, drawn in order (the last one is on top).
    pub children: Vec<ScrollRegion>,
}

impl ScrollRegion {
    /// Creates a region that does not scroll itself.
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Self::default()
        }
    }

    /// Sets which directions the region can still scroll.
    pub fn scrollable(mut self, backward: bool, forward: bool) -> Self {
        self.can_scroll_backward = backward;
        self.can_scroll_forward = forward;
        self
    }

    /// Appends a child region.
    pub fn child(mut self, child: ScrollRegion) -> Self {
        self.children.push(child);
        self
    }

    fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.left + self.width && y >= self.top && y < self.top + self.height
    }

    fn scrolls_toward(&self, dx: f32) -> bool {
        if dx > 0.0 {
            self.can_scroll_backward
        } else if dx < 0.0 {
            self.can_scroll_forward
        } else {
            false
        }
    }

    fn hit(&self, check_self: bool, dx: f32, x: f32, y: f32) -> bool {
        let content_x = x + self.scroll_x;
        let content_y = y + self.scroll_y;
        let child_hit = self.children.iter().rev().any(|child| {
            child.contains(content_x, content_y)
                && child.hit(true, dx, content_x - child.left, content_y - child.top)
        });
        child_hit || (check_self && self.scrolls_toward(dx))
    }
}

impl NestedScroll for ScrollRegion {
    fn can_scroll(&self, dx: f32, x: f32, y: f32) -> bool {
        self.hit(false, dx, x, y)
    }
}

/// Pixel thresholds and collaborators a drag decision depends on.
#[derive(Clone, Copy)]
pub struct DragContext<'a> {
    /// Distance the pointer must travel before a drag starts.
    pub touch_slop: f32,
    /// Width of the edge zones that defer to nested content.
    pub gutter: f32,
    /// Viewport width.
    pub width: f32,
    /// Velocity cap, in pixels per second.
    pub max_velocity: f32,
    /// Nested content probe.
    pub nested: Option<&'a dyn NestedScroll>,
}

/// What the tracker made of one pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragStep {
    /// Nothing to do for this event.
    Ignored,
    /// The first pointer touched down.
    Touched,
    /// Still undetermined.
    Pending,
    /// The gesture was rejected; nested content owns it.
    Declined,
    /// The slop was crossed this event and the pointer moved by `delta_x`
    /// beyond it.
    Began {
        /// Finger movement past the slop, positive to the right.
        delta_x: f32,
    },
    /// The pointer moved while dragging.
    Dragged {
        /// Finger movement since the previous event, positive to the right.
        delta_x: f32,
    },
    /// The last pointer lifted while dragging.
    Released {
        /// Horizontal velocity in pixels per second.
        velocity: f32,
        /// Finger displacement since the gesture started.
        travel: f32,
    },
    /// The host cancelled a drag.
    Cancelled,
    /// A pointer lifted or the host cancelled without a drag in progress.
    Ended,
}

/// Drag state machine over the active pointer.
#[derive(Debug, Clone)]
pub struct DragTracker {
    phase: GesturePhase,
    active_pointer: Option<u64>,
    initial_x: f32,
    initial_y: f32,
    last_x: f32,
    last_y: f32,
    velocity: VelocityTracker,
}

impl Default for DragTracker {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Idle,
            active_pointer: None,
            initial_x: 0.0,
            initial_y: 0.0,
            last_x: 0.0,
            last_y: 0.0,
            velocity: VelocityTracker::new(0),
        }
    }
}

impl DragTracker {
    /// Creates an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Whether the tracker is following a pointer.
    pub fn is_dragging(&self) -> bool {
        self.phase == GesturePhase::Dragging
    }

    /// Id of the pointer being followed.
    pub fn active_pointer(&self) -> Option<u64> {
        self.active_pointer
    }

    /// Claims the gesture immediately, skipping the slop check. Used when a
    /// touch catches a running settle.
    pub fn claim(&mut self) {
        if self.active_pointer.is_some() {
            self.phase = GesturePhase::Dragging;
        }
    }

    /// Forgets the gesture.
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.active_pointer = None;
        self.velocity.clear();
    }

    /// Feeds one event through the state machine.
    pub fn handle(&mut self, event: &PointerEvent, context: &DragContext<'_>) -> DragStep {
        match event.action {
            PointerAction::Down => self.on_down(event),
            PointerAction::Move => self.on_move(event, context),
            PointerAction::Up => self.on_up(event, context),
            PointerAction::Cancel => {
                let was_dragging = self.is_dragging();
                self.reset();
                if was_dragging {
                    DragStep::Cancelled
                } else {
                    DragStep::Ended
                }
            }
            PointerAction::PointerDown(id) => self.on_pointer_down(event, id),
            PointerAction::PointerUp(id) => self.on_pointer_up(event, id),
        }
    }

    fn on_down(&mut self, event: &PointerEvent) -> DragStep {
        let Some(pointer) = event.pointers.first() else {
            warn!("Pointer down without any pointer; ignoring");
            return DragStep::Ignored;
        };
        self.phase = GesturePhase::Undetermined;
        self.active_pointer = Some(pointer.id);
        self.initial_x = pointer.x;
        self.initial_y = pointer.y;
        self.last_x = pointer.x;
        self.last_y = pointer.y;
        self.velocity = VelocityTracker::new(event.time_nanos);
        self.velocity.add_position(event.time_nanos, pointer.x);
        DragStep::Touched
    }

    fn active(&self, event: &PointerEvent) -> Option<Pointer> {
        let id = self.active_pointer?;
        match event.pointer(id) {
            Some(pointer) => Some(*pointer),
            None => {
                warn!("Active pointer {id} missing from {:?}; skipping frame", event.action);
                None
            }
        }
    }

    fn on_move(&mut self, event: &PointerEvent, context: &DragContext<'_>) -> DragStep {
        match self.phase {
            GesturePhase::Idle => return DragStep::Ignored,
            GesturePhase::NotDragging => return DragStep::Declined,
            GesturePhase::Undetermined | GesturePhase::Dragging => {}
        }
        let Some(pointer) = self.active(event) else {
            return DragStep::Ignored;
        };
        self.velocity.add_position(event.time_nanos, pointer.x);

        if self.phase == GesturePhase::Dragging {
            let delta_x = pointer.x - self.last_x;
            self.last_x = pointer.x;
            self.last_y = pointer.y;
            trace!(delta_x, "Drag move");
            return DragStep::Dragged { delta_x };
        }

        let dx = pointer.x - self.last_x;
        let x_diff = dx.abs();
        let y_diff = (pointer.y - self.initial_y).abs();

        if dx != 0.0
            && !self.is_gutter_drag(self.last_x, dx, context)
            && context
                .nested
                .is_some_and(|nested| nested.can_scroll(dx, pointer.x, pointer.y))
        {
            debug!("Nested content scrolls by {dx}; passing the gesture through");
            self.last_x = pointer.x;
            self.last_y = pointer.y;
            self.phase = GesturePhase::NotDragging;
            return DragStep::Declined;
        }

        if x_diff > context.touch_slop && x_diff > y_diff {
            self.phase = GesturePhase::Dragging;
            // Start from the slop boundary so the content does not jump.
            self.last_x = if dx > 0.0 {
                self.initial_x + context.touch_slop
            } else {
                self.initial_x - context.touch_slop
            };
            self.last_y = pointer.y;
            let delta_x = pointer.x - self.last_x;
            self.last_x = pointer.x;
            debug!(initial_x = self.initial_x, delta_x, "Drag started");
            return DragStep::Began { delta_x };
        }

        if y_diff > context.touch_slop {
            debug!("Vertical movement past slop; not dragging");
            self.phase = GesturePhase::NotDragging;
            return DragStep::Declined;
        }
        DragStep::Pending
    }

    fn on_up(&mut self, event: &PointerEvent, context: &DragContext<'_>) -> DragStep {
        if !self.is_dragging() {
            self.reset();
            return DragStep::Ended;
        }
        let x = self.active(event).map_or(self.last_x, |pointer| pointer.x);
        self.velocity.add_position(event.time_nanos, x);
        let velocity = self.velocity.resolve(event.time_nanos, context.max_velocity);
        let travel = x - self.initial_x;
        self.reset();
        DragStep::Released { velocity, travel }
    }

    fn on_pointer_down(&mut self, event: &PointerEvent, id: u64) -> DragStep {
        let Some(pointer) = event.pointer(id) else {
            warn!("Pointer {id} went down but is missing from the event");
            return DragStep::Ignored;
        };
        if self.phase == GesturePhase::Idle {
            return DragStep::Ignored;
        }
        self.active_pointer = Some(id);
        self.last_x = pointer.x;
        self.last_y = pointer.y;
        DragStep::Pending
    }

    fn on_pointer_up(&mut self, event: &PointerEvent, id: u64) -> DragStep {
        if self.active_pointer != Some(id) {
            return DragStep::Pending;
        }
        let Some(replacement) = event.pointers.iter().find(|pointer| pointer.id != id) else {
            warn!("Active pointer {id} lifted with no pointer left to follow");
            return DragStep::Ignored;
        };
        debug!(from = id, to = replacement.id, "Switching active pointer");
        self.active_pointer = Some(replacement.id);
        self.last_x = replacement.x;
        self.last_y = replacement.y;
        self.velocity.clear();
        self.velocity.add_position(event.time_nanos, replacement.x);
        DragStep::Pending
    }

    fn is_gutter_drag(&self, x: f32, dx: f32, context: &DragContext<'_>) -> bool {
        (x < context.gutter && dx > 0.0) || (x > context.width - context.gutter && dx < 0.0)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;
    use crate::testing::{down, move_to, ms, up};

    fn context(nested: Option<&dyn NestedScroll>) -> DragContext<'_> {
        DragContext {
            touch_slop: 16.0,
            gutter: 16.0,
            width: 1280.0,
            max_velocity: 8000.0,
            nested,
        }
    }

    #[test]
    fn drag_starts_past_the_slop_from_its_boundary() {
        let mut tracker = DragTracker::new();
        let context = context(None);
        assert_eq!(tracker.handle(&down(600.0, 300.0, 0), &context), DragStep::Touched);
        assert_eq!(
            tracker.handle(&move_to(590.0, 300.0, ms(8)), &context),
            DragStep::Pending
        );
        assert_eq!(
            tracker.handle(&move_to(570.0, 302.0, ms(16)), &context),
            DragStep::Began { delta_x: -14.0 }
        );
        assert_eq!(
            tracker.handle(&move_to(560.0, 302.0, ms(24)), &context),
            DragStep::Dragged { delta_x: -10.0 }
        );
        assert_eq!(tracker.phase().disposition(), GestureDisposition::Claimed);
    }

    #[test]
    fn vertical_movement_declines_the_gesture() {
        let mut tracker = DragTracker::new();
        let context = context(None);
        tracker.handle(&down(600.0, 300.0, 0), &context);
        assert_eq!(
            tracker.handle(&move_to(605.0, 340.0, ms(8)), &context),
            DragStep::Declined
        );
        assert_eq!(
            tracker.handle(&move_to(400.0, 340.0, ms(16)), &context),
            DragStep::Declined
        );
        assert_eq!(tracker.handle(&up(400.0, 340.0, ms(24)), &context), DragStep::Ended);
        assert_eq!(tracker.phase(), GesturePhase::Idle);
    }

    #[test]
    fn nested_content_gets_the_gesture_first() {
        let nested = ScrollRegion::new(0.0, 0.0, 1280.0, 800.0)
            .child(ScrollRegion::new(100.0, 100.0, 400.0, 200.0).scrollable(false, true));
        let mut tracker = DragTracker::new();
        let context = context(Some(&nested));
        tracker.handle(&down(300.0, 200.0, 0), &context);
        assert_eq!(
            tracker.handle(&move_to(260.0, 200.0, ms(8)), &context),
            DragStep::Declined
        );

        // Same drag outside the nested region belongs to the pager.
        tracker.handle(&down(900.0, 600.0, ms(100)), &context);
        assert!(matches!(
            tracker.handle(&move_to(860.0, 600.0, ms(108)), &context),
            DragStep::Began { .. }
        ));
    }

    #[test]
    fn gutter_drags_skip_the_nested_probe() {
        let always = |_dx: f32, _x: f32, _y: f32| true;
        let mut tracker = DragTracker::new();
        let context = context(Some(&always));
        tracker.handle(&down(5.0, 200.0, 0), &context);
        assert!(matches!(
            tracker.handle(&move_to(45.0, 200.0, ms(8)), &context),
            DragStep::Began { .. }
        ));

        tracker.handle(&down(1275.0, 200.0, ms(100)), &context);
        assert!(matches!(
            tracker.handle(&move_to(1235.0, 200.0, ms(108)), &context),
            DragStep::Began { .. }
        ));

        // Dragging back toward the edge is not a gutter drag.
        tracker.handle(&down(1275.0, 200.0, ms(200)), &context);
        assert_eq!(
            tracker.handle(&move_to(1279.0, 200.0, ms(208)), &context),
            DragStep::Declined
        );
    }

    #[test]
    fn scroll_region_tests_children_innermost_first() {
        let inner = ScrollRegion::new(10.0, 10.0, 50.0, 50.0).scrollable(true, false);
        let outer = ScrollRegion::new(100.0, 0.0, 200.0, 200.0).child(inner);
        let root = ScrollRegion::new(0.0, 0.0, 1280.0, 800.0).child(outer);
        assert!(root.can_scroll(5.0, 120.0, 20.0));
        assert!(!root.can_scroll(-5.0, 120.0, 20.0));
        assert!(!root.can_scroll(5.0, 250.0, 150.0));

        let scrolled = ScrollRegion {
            scroll_x: 100.0,
            ..root.clone()
        };
        assert!(!scrolled.can_scroll(5.0, 120.0, 20.0));
        assert!(scrolled.can_scroll(5.0, 20.0, 20.0));
    }

    #[test]
    fn lifting_the_active_pointer_switches_to_another() {
        let mut tracker = DragTracker::new();
        let context = context(None);
        tracker.handle(&down(600.0, 300.0, 0), &context);
        tracker.handle(&move_to(500.0, 300.0, ms(8)), &context);
        assert!(tracker.is_dragging());

        let two = |action, time| PointerEvent {
            action,
            pointers: smallvec![
                Pointer { id: 0, x: 500.0, y: 300.0 },
                Pointer { id: 1, x: 200.0, y: 300.0 },
            ],
            time_nanos: time,
        };
        tracker.handle(&two(PointerAction::PointerDown(1), ms(10)), &context);
        assert_eq!(tracker.active_pointer(), Some(1));
        tracker.handle(&two(PointerAction::PointerUp(1), ms(12)), &context);
        assert_eq!(tracker.active_pointer(), Some(0));

        let step = tracker.handle(&move_to(490.0, 300.0, ms(20)), &context);
        assert_eq!(step, DragStep::Dragged { delta_x: -10.0 });
    }

    #[test]
    fn missing_active_pointer_is_a_no_op() {
        let mut tracker = DragTracker::new();
        let context = context(None);
        tracker.handle(&down(600.0, 300.0, 0), &context);
        let stray = PointerEvent {
            action: PointerAction::Move,
            pointers: smallvec![Pointer { id: 7, x: 100.0, y: 300.0 }],
            time_nanos: ms(8),
        };
        assert_eq!(tracker.handle(&stray, &context), DragStep::Ignored);
        assert_eq!(tracker.phase(), GesturePhase::Undetermined);
    }

    #[test]
    fn release_reports_velocity_and_travel() {
        let mut tracker = DragTracker::new();
        let context = context(None);
        tracker.handle(&down(700.0, 300.0, 0), &context);
        tracker.handle(&move_to(685.0, 300.0, ms(8)), &context);
        tracker.handle(&move_to(670.0, 300.0, ms(16)), &context);
        tracker.claim();
        let DragStep::Released { velocity, travel } =
            tracker.handle(&up(670.0, 300.0, ms(16)), &context)
        else {
            panic!("expected a release");
        };
        assert_eq!(travel, -30.0);
        assert!(velocity < -1500.0, "velocity was {velocity}");
    }
}
