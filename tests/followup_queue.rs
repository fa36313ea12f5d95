mod common;

use approx::assert_abs_diff_eq;
use common::{ic220501a_campaign, InMemoryScheduler};
use planobs::api::{ApiError, Queue, TriggerSpec};

const DASHES: &str = "-------------------------------------------------";

fn ic220501a_queue(scheduler: InMemoryScheduler) -> Queue {
    let mut queue = Queue::with_backend("DESY", scheduler);
    for trigger in ic220501a_campaign().triggers() {
        queue
            .add_trigger_to_queue(
                TriggerSpec::new("ToO_IC220501A", trigger.mjd_start, trigger.field_id, trigger.filter_id)
                    .exposure_time(trigger.exposure_time),
            )
            .unwrap();
    }
    queue
}

#[test]
fn test_multiday_summary() {
    let expected = format!(
        "\nYour multi-day observation plan for IC220501A\n\
         {DASHES}\n\
         g-band observations\n\
         Night 1 2022-05-03 10:35:00 - 2022-05-03 10:40:00\n\
         Night 2 2022-05-04 10:38:00 - 2022-05-04 10:38:30\n\
         Night 3 2022-05-05 10:37:00 - 2022-05-05 10:37:30\n\
         Night 5 2022-05-07 10:35:00 - 2022-05-07 10:35:30\n\
         Night 7 2022-05-09 10:33:00 - 2022-05-09 10:33:30\n\
         Night 9 2022-05-11 10:30:00 - 2022-05-11 10:30:30\n\
         {DASHES}\n\n\
         {DASHES}\n\
         r-band observations\n\
         Night 1 2022-05-03 11:05:00 - 2022-05-03 11:10:00\n\
         Night 9 2022-05-11 11:00:00 - 2022-05-11 11:00:30\n\
         {DASHES}\n\n"
    );
    let campaign = ic220501a_campaign();
    assert_eq!(campaign.start_date(), 59702.0);
    assert_eq!(campaign.field(), Some(593));
    assert_eq!(campaign.nights().len(), 6);
    assert_eq!(campaign.summary_text(), expected);
}

#[test]
fn test_ic220501a_triggers() {
    let expected: [(u8, f64, f64, u32); 8] = [
        (1, 59702.44097222222, 59702.44444444444, 300),
        (1, 59703.44305555556, 59703.44340277778, 30),
        (1, 59704.44236111111, 59704.442708333336, 30),
        (1, 59706.44097222222, 59706.44131944444, 30),
        (1, 59708.43958333333, 59708.439930555556, 30),
        (1, 59710.4375, 59710.43784722222, 30),
        (2, 59702.461805555555, 59702.465277777774, 300),
        (2, 59710.458333333336, 59710.45868055556, 30),
    ];

    let queue = ic220501a_queue(InMemoryScheduler::default());
    let triggers = queue.get_triggers();
    assert_eq!(triggers.len(), expected.len());

    for ((index, trigger), (i, (filter_id, start, end, exposure))) in
        triggers.iter().zip(expected.iter().enumerate())
    {
        assert_eq!(*index, i);
        assert_eq!(trigger.user, "DESY");
        assert_eq!(trigger.queue_name, format!("ToO_IC220501A_{i}"));
        assert_eq!(trigger.queue_type, "list");
        assert_abs_diff_eq!(trigger.validity_window_mjd[0], *start, epsilon = 1e-9);
        assert_abs_diff_eq!(trigger.validity_window_mjd[1], *end, epsilon = 1e-9);

        let target = &trigger.targets[0];
        assert_eq!(target.request_id, 1);
        assert_eq!(target.field_id, 593);
        assert_eq!(target.filter_id, *filter_id);
        assert_eq!(target.subprogram_name, "ToO_Neutrino");
        assert_eq!(target.program_pi, "Kulkarni");
        assert_eq!(target.program_id, 2);
        assert_eq!(target.exposure_time, *exposure);
    }
}

#[test]
fn test_submit_and_delete() {
    let scheduler = InMemoryScheduler::default();
    let queue = ic220501a_queue(scheduler.clone());

    // Nothing submitted yet: the deletion is rejected by the scheduler
    assert!(matches!(queue.delete_queue(), Err(ApiError::Request { .. })));

    queue.submit_queue().unwrap();
    let names = queue.get_too_queue_names().unwrap();
    assert_eq!(names.len(), 8);
    assert_eq!(names[0], "ToO_IC220501A_0");
    assert_eq!(names[7], "ToO_IC220501A_7");

    queue.delete_queue().unwrap();
    assert!(queue.get_too_queues().unwrap().data.is_empty());
    assert!(scheduler.queues.lock().unwrap().is_empty());
    // The local queue is kept
    assert_eq!(queue.len(), 8);
}
