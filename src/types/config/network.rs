//! Network-related configuration types

nonzero_setting! {
    /// A validated network port number that cannot be zero
    ///
    /// Port 0 asks the OS for an ephemeral port, which makes no sense as a
    /// dial target.
    ///
    /// # Examples
    /// ```
    /// use tcp_pool::types::Port;
    ///
    /// let port = Port::new(9000).unwrap();
    /// assert_eq!(port.get(), 9000);
    ///
    /// // Port 0 is invalid
    /// assert!(Port::new(0).is_none());
    /// ```
    #[doc(alias = "port_number")]
    #[doc(alias = "tcp_port")]
    pub struct Port(u16), zero => InvalidPort;
}
