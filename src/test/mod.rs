mod addr;
mod clock;
mod dhcp_lease;
mod fragments;
mod hook_chain;
mod office_lan;
mod routing_table;
mod sim_time;
mod stp_convergence;
