//! A single-rank LocalWorld must behave exactly like NoComm: couplings
//! switch between them based on process count and expect no difference.

use mesh_bridge::comm::{Communicator, LocalWorld, NoComm};

#[test]
fn rank_and_size_agree() {
    let world = LocalWorld::new(1);
    let local = world.comm(0);
    assert_eq!(local.rank(), NoComm.rank());
    assert_eq!(local.size(), NoComm.size());
}

#[test]
fn broadcast_is_identity_on_one_rank() {
    let world = LocalWorld::new(1);
    let local = world.comm(0);

    let mut serial_buf = [3, 1, 4, 1, 5];
    let mut local_buf = serial_buf;
    NoComm.broadcast_i32(0, &mut serial_buf).unwrap();
    local.broadcast_i32(0, &mut local_buf).unwrap();
    assert_eq!(serial_buf, local_buf);
}

#[test]
fn reduce_is_identity_on_one_rank() {
    let world = LocalWorld::new(1);
    let local = world.comm(0);

    let mut serial_buf = [-1, 0, 42, i32::MIN];
    let mut local_buf = serial_buf;
    NoComm.all_reduce_max_i32(&mut serial_buf).unwrap();
    local.all_reduce_max_i32(&mut local_buf).unwrap();
    assert_eq!(serial_buf, local_buf);
}

#[test]
fn gathers_agree_on_one_rank() {
    let world = LocalWorld::new(1);
    let local = world.comm(0);

    assert_eq!(
        NoComm.all_gather_i32(9).unwrap(),
        local.all_gather_i32(9).unwrap()
    );
    let contribution = [5, -3, 0, 7];
    assert_eq!(
        NoComm.all_gather_varying_i32(&contribution).unwrap(),
        local.all_gather_varying_i32(&contribution).unwrap()
    );
    assert_eq!(
        NoComm.all_gather_varying_i32(&[]).unwrap(),
        local.all_gather_varying_i32(&[]).unwrap()
    );
}
