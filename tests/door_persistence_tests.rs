use coopbot::config::Config;
use coopbot::door::{DoorController, Mode, Position, StateFile};
use coopbot::hardware::{Direction, HardwareError};
use coopbot::testing::{RecordingStepper, StepperCall};
use std::fs;
use tempfile::tempdir;

fn config() -> Config {
    Config {
        steps_per_revolution: Some(4),
        revolutions: Some(2),
        ..Default::default()
    }
}

fn controller(path: &std::path::Path, stepper: &RecordingStepper) -> DoorController {
    DoorController::new(&config(), StateFile::new(path), Box::new(stepper.clone()))
}

#[test]
fn test_position_survives_restart_and_mode_does_not() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("door.state");
    let stepper = RecordingStepper::new();

    {
        let mut door = controller(&path, &stepper);
        assert_eq!(door.position(), Position::Closed);
        assert_eq!(fs::read_to_string(&path).unwrap(), "DOOR_STATUS=0\n");

        door.open_manual();
        assert_eq!(door.mode(), Mode::Manual);
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), "DOOR_STATUS=1\n");

    let door = controller(&path, &stepper);
    assert_eq!(door.position(), Position::Open);
    assert_eq!(door.mode(), Mode::Auto);

    assert_eq!(
        stepper.calls(),
        vec![
            StepperCall::Rotate {
                direction: Direction::Clockwise,
                steps: 8,
            },
            StepperCall::Indicator(false),
        ]
    );
}

#[test]
fn test_reconciliation_is_idempotent_across_restarts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("door.state");
    let stepper = RecordingStepper::new();

    let mut door = controller(&path, &stepper);
    assert!(door.close_auto().is_none());
    assert!(door.open_auto().is_some());
    assert!(door.open_auto().is_none());
    drop(door);

    let mut door = controller(&path, &stepper);
    assert!(door.open_auto().is_none());
    assert_eq!(stepper.calls().len(), 2);
}

#[test]
fn test_garbage_record_is_replaced() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("door.state");
    fs::write(&path, "the door is open, I think").unwrap();

    let door = controller(&path, &RecordingStepper::new());
    assert!(door.is_closed());
    assert_eq!(fs::read_to_string(&path).unwrap(), "DOOR_STATUS=0\n");
}

#[test]
fn test_fault_still_records_the_move() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("door.state");
    let stepper = RecordingStepper::failing(HardwareError::Failure("stalled".to_string()));

    let mut door = controller(&path, &stepper);
    assert!(door.open_auto().is_some());

    assert_eq!(
        door.last_fault(),
        Some(&HardwareError::Failure("stalled".to_string()))
    );
    assert_eq!(
        StateFile::new(&path).read().unwrap(),
        Some(Position::Open)
    );
}
