use {
    relay_command::{
        CommandBuffer, Event, EventState, EventStatus, Fence, PipelineStageFlags, Queue, QueueConfig, QueueId,
        RenderFlags, Semaphore, Submission,
    },
    relay_core::mock::{MockDevice, MockJob, SyncId},
    std::sync::Arc,
};

fn setup() -> (Arc<MockDevice>, Queue<MockDevice>) {
    let _ = simple_logger::init();
    let device = Arc::new(MockDevice::new());
    let queue = Queue::new(device.clone(), QueueId(0), QueueConfig::default());
    (device, queue)
}

#[test]
fn host_set_and_reset() {
    let (device, _queue) = setup();
    let event = Event::create(&device).unwrap();
    assert_eq!(event.status().unwrap(), EventStatus::Reset);

    event.set().unwrap();
    assert_eq!(event.status().unwrap(), EventStatus::Set);

    event.reset().unwrap();
    assert_eq!(event.status().unwrap(), EventStatus::Reset);
}

#[test]
fn wait_after_host_set_uses_event() {
    let (device, mut queue) = setup();
    let event = Event::create(&device).unwrap();
    event.set().unwrap();

    let mut buffer = CommandBuffer::<MockDevice>::new();
    buffer
        .wait_events(Some((event.clone(), PipelineStageFlags::FRAGMENT_SHADER)))
        .render(MockJob::new("render"), RenderFlags::RUN_FRAGMENT);
    queue
        .submit(&[Submission::new().submits(Some(&buffer))], None)
        .unwrap();

    let jobs = device.jobs();
    let record = &jobs[0];
    let barrier = record.fragment_barrier.unwrap();
    assert!(record.barrier.is_none());
    assert!(device.is_signaled(barrier));

    // Event primitive feeds the completion behind the barrier.
    let null_jobs = device.null_jobs();
    let chained = null_jobs.iter().find(|null| null.signal == barrier).unwrap();
    let completion = chained.waits[0];
    let merged = null_jobs.iter().find(|null| null.signal == completion).unwrap();
    assert_eq!(merged.waits.len(), 1);
}

#[test]
fn device_set_orders_waiting_work() {
    let (device, mut queue) = setup();
    let event = Event::create(&device).unwrap();

    let mut producer = CommandBuffer::<MockDevice>::new();
    producer
        .dispatch(MockJob::new("produce"))
        .set_event(event.clone(), PipelineStageFlags::COMPUTE_SHADER);
    queue
        .submit(&[Submission::new().submits(Some(&producer))], None)
        .unwrap();

    assert_eq!(event.state(), EventState::SetByDevice);
    assert_eq!(event.status().unwrap(), EventStatus::Reset);

    let mut consumer = CommandBuffer::<MockDevice>::new();
    consumer
        .wait_events(Some((event.clone(), PipelineStageFlags::TRANSFER)))
        .transfer(MockJob::new("consume"), false);
    queue
        .submit(&[Submission::new().submits(Some(&consumer))], None)
        .unwrap();

    let produce = device.job_index("produce").unwrap();
    let consume = device.job_index("consume").unwrap();
    assert!(device.job_waits_on_job(consume, produce));

    device.complete_job(produce);
    assert_eq!(event.status().unwrap(), EventStatus::Set);
}

#[test]
fn device_reset_after_work() {
    let (device, mut queue) = setup();
    let event = Event::create(&device).unwrap();
    event.set().unwrap();

    let mut buffer = CommandBuffer::<MockDevice>::new();
    buffer
        .transfer(MockJob::new("copy"), false)
        .reset_event(event.clone(), PipelineStageFlags::TRANSFER);
    queue
        .submit(&[Submission::new().submits(Some(&buffer))], None)
        .unwrap();

    assert_eq!(event.state(), EventState::ResetByDevice);
    assert_eq!(event.status().unwrap(), EventStatus::Set);
    device.complete_all();
    assert_eq!(event.status().unwrap(), EventStatus::Reset);
}

#[test]
fn every_primitive_destroyed_once() {
    let (device, mut queue) = setup();
    let event = Event::create(&device).unwrap();
    let semaphores = vec![
        Semaphore::binary(&device).unwrap(),
        Semaphore::binary(&device).unwrap(),
    ];
    let mut fence = Fence::new(&device, false).unwrap();

    let mut first = CommandBuffer::<MockDevice>::new();
    first
        .dispatch(MockJob::new("compute"))
        .occlusion_query(MockJob::new("query"))
        .pipeline_barrier(
            PipelineStageFlags::COMPUTE_SHADER,
            PipelineStageFlags::FRAGMENT_SHADER | PipelineStageFlags::TRANSFER,
            false,
        )
        .render(
            MockJob::new("render"),
            RenderFlags::RUN_FRAGMENT | RenderFlags::HAS_OCCLUSION_QUERY | RenderFlags::REQUIRES_SPLIT,
        )
        .set_event(event.clone(), PipelineStageFlags::BOTTOM_OF_PIPE);

    let mut second = CommandBuffer::<MockDevice>::new();
    second
        .wait_events(Some((event.clone(), PipelineStageFlags::TOP_OF_PIPE)))
        .transfer(MockJob::new("copy"), true)
        .pipeline_barrier(
            PipelineStageFlags::TRANSFER,
            PipelineStageFlags::VERTEX_SHADER,
            true,
        )
        .render(MockJob::new("again"), RenderFlags::RUN_FRAGMENT);

    queue
        .submit(
            &[
                Submission::new().submits(Some(&first)).signal(&semaphores),
                Submission::new()
                    .wait(semaphores.iter().map(|semaphore| (semaphore, PipelineStageFlags::ALL_COMMANDS)))
                    .submits(Some(&second)),
                Submission::new().wait(Some((&semaphores[0], PipelineStageFlags::HOST))),
            ],
            Some(&mut fence),
        )
        .unwrap();
    queue.submit(&[], None).unwrap();
    assert_eq!(queue.submitted_sub_commands(), 9);

    device.complete_all();
    assert!(fence.check_signaled().unwrap().is_some());
    queue.wait_idle().unwrap();

    // Installed primitives are alive.
    for sync in queue.completions().syncs().chain(queue.barriers().syncs()) {
        assert!(device.is_live(sync.raw().id()));
    }

    drop(queue);
    event.destroy();
    drop(semaphores);
    drop(fence);
    drop(first);
    drop(second);

    assert_eq!(device.live(), 0);
    for id in 0..device.created() {
        assert_eq!(device.destroy_count(SyncId(id)), 1);
    }
}
